//! Error types for extsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from decoding a subscription identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Fewer than three non-empty `_`-delimited components.
    #[error("invalid subscription identifier '{id}': expected <org>_<repo>_<path>")]
    InvalidIdentifier { id: String },
}

/// Errors from parsing a subscription manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest exists but is not a valid YAML mapping.
    #[error("malformed manifest in {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from loading or validating the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file exists but could not be parsed.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.extsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A required value is unset or blank.
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),
}

/// Errors surfaced by a [`HostApi`](crate::host::HostApi) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The requested object (repo, file, directory, release) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A revision marker was stale or the branch already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The host answered with an unexpected status code.
    #[error("host returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never reached the host (DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("could not decode host response: {0}")]
    Decode(String),
}

impl HostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}
