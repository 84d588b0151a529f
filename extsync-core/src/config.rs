//! Run configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.extsync/
//!   config.yaml   (optional: every field may also come from env / flags)
//! ```
//!
//! # API pattern
//!
//! - `load_at(home: &Path)`: explicit home; used in tests with `TempDir`
//! - `load()`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Values are layered file ← environment ← flags by the binary through
//! [`RunConfig::merge`]; [`RunConfig::validate`] runs before any host call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Everything one publish run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base URL of the hosting service, e.g. `https://git.example.com`.
    pub host_url: Option<String>,
    /// API token; never serialised back to disk.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub source_org: Option<String>,
    pub source_repo: Option<String>,
    /// Extension directories inside the source repository.
    pub extension_paths: Vec<String>,
    pub release_tag: Option<String>,
    pub dry_run: bool,
    /// Render the report as JSON instead of grouped text.
    pub json_report: bool,
    /// Overall run deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Directory of `.tera` files overriding the embedded templates.
    pub template_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Layer `overrides` on top of `self`. Set values in `overrides` win;
    /// boolean flags are sticky once enabled on either side.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            host_url: overrides.host_url.or(self.host_url),
            token: overrides.token.or(self.token),
            source_org: overrides.source_org.or(self.source_org),
            source_repo: overrides.source_repo.or(self.source_repo),
            extension_paths: if overrides.extension_paths.is_empty() {
                self.extension_paths
            } else {
                overrides.extension_paths
            },
            release_tag: overrides.release_tag.or(self.release_tag),
            dry_run: self.dry_run || overrides.dry_run,
            json_report: self.json_report || overrides.json_report,
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            template_dir: overrides.template_dir.or(self.template_dir),
        }
    }

    /// Check every value the run cannot start without.
    ///
    /// Returns the first missing field in a fixed order: source org, source
    /// repo, release tag, host URL, token. An unset release tag is an error;
    /// there is no fallback branch name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.source_org, "source_org")?;
        require(&self.source_repo, "source_repo")?;
        require(&self.release_tag, "release_tag")?;
        require(&self.host_url, "host_url")?;
        require(&self.token, "token")?;
        Ok(())
    }

    /// Like [`validate`](Self::validate) without the release tag; enough to
    /// discover subscribers.
    pub fn validate_discovery(&self) -> Result<(), ConfigError> {
        require(&self.source_org, "source_org")?;
        require(&self.source_repo, "source_repo")?;
        require(&self.host_url, "host_url")?;
        require(&self.token, "token")?;
        Ok(())
    }

    pub fn host_url(&self) -> &str {
        self.host_url.as_deref().unwrap_or_default()
    }

    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    pub fn source_org(&self) -> &str {
        self.source_org.as_deref().unwrap_or_default()
    }

    pub fn source_repo(&self) -> &str {
        self.source_repo.as_deref().unwrap_or_default()
    }

    pub fn release_tag(&self) -> &str {
        self.release_tag.as_deref().unwrap_or_default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn require(value: &Option<String>, field: &'static str) -> Result<(), ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ConfigError::Missing(field)),
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.extsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".extsync").join("config.yaml")
}

/// Load the config file under `home`. A missing file yields the default
/// (empty) config; malformed YAML is [`ConfigError::Parse`].
pub fn load_at(home: &Path) -> Result<RunConfig, ConfigError> {
    load_from(&config_path_at(home))
}

/// Load an explicit config file; same rules as [`load_at`].
pub fn load_from(path: &Path) -> Result<RunConfig, ConfigError> {
    let path = path.to_path_buf();
    if !path.exists() {
        return Ok(RunConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    if contents.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<RunConfig, ConfigError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full() -> RunConfig {
        RunConfig {
            host_url: Some("https://git.example.com".into()),
            token: Some("secret".into()),
            source_org: Some("acme".into()),
            source_repo: Some("platform".into()),
            extension_paths: vec!["src/Acme.Payments".into()],
            release_tag: Some("v1.2.0".into()),
            ..RunConfig::default()
        }
    }

    #[test]
    fn full_config_validates() {
        full().validate().expect("valid");
    }

    #[test]
    fn missing_release_tag_is_fatal() {
        let cfg = RunConfig { release_tag: None, ..full() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("release_tag"))));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let cfg = RunConfig { token: Some("  ".into()), ..full() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("token"))));
    }

    #[test]
    fn merge_prefers_overrides() {
        let base = full();
        let merged = base.merge(RunConfig {
            release_tag: Some("v2.0.0".into()),
            dry_run: true,
            ..RunConfig::default()
        });
        assert_eq!(merged.release_tag(), "v2.0.0");
        assert_eq!(merged.source_org(), "acme");
        assert_eq!(merged.extension_paths, vec!["src/Acme.Payments".to_string()]);
        assert!(merged.dry_run);
    }

    #[test]
    fn discovery_does_not_need_a_tag() {
        let cfg = RunConfig { release_tag: None, ..full() };
        cfg.validate_discovery().expect("valid for discovery");
        let cfg = RunConfig { host_url: None, ..cfg };
        assert!(matches!(cfg.validate_discovery(), Err(ConfigError::Missing("host_url"))));
    }

    #[test]
    fn load_missing_file_is_default() {
        let home = TempDir::new().unwrap();
        assert_eq!(load_at(home.path()).unwrap(), RunConfig::default());
    }

    #[test]
    fn token_is_never_serialised() {
        let yaml = serde_yaml::to_string(&full()).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
