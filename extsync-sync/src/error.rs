//! Error types for extsync-sync.

use thiserror::Error;

use extsync_core::error::{ConfigError, HostError, ManifestError};
use extsync_detector::DetectError;
use extsync_renderer::RenderError;

/// All errors that can arise from a publish run.
///
/// Variants marked *fatal* abort the whole run; the rest are caught by the
/// per-subscriber loop and recorded in the report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid run configuration (fatal).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Release metadata could not be resolved (fatal).
    #[error("failed to resolve release {tag}: {source}")]
    Release {
        tag: String,
        #[source]
        source: HostError,
    },

    /// Organisations could not be listed (fatal).
    #[error("failed to list organizations: {0}")]
    Organizations(#[source] HostError),

    /// A subscriber manifest exists but is corrupt (fatal).
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Project layout analysis failed outright (fatal).
    #[error("failed to analyze project layout of {repository}: {source}")]
    Analysis {
        repository: String,
        #[source]
        source: DetectError,
    },

    /// The source extension directory is missing or empty.
    #[error("nothing to publish: {path} is empty or does not exist")]
    NothingToPublish { path: String },

    /// A commit was requested with no operations.
    #[error("refusing to commit an empty change set")]
    EmptyChangeSet,

    /// Any other host failure.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("report JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Aggregate error of a finished run with at least one failed subscriber.
    #[error("{failed} of {total} subscribers failed")]
    SubscribersFailed { failed: usize, total: usize },
}
