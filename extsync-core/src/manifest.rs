//! Subscription manifest: the per-repository file declaring which
//! extensions a repository subscribes to.
//!
//! ```yaml
//! subscriptions:
//!   - acme_platform_src_Acme.Payments
//!   - acme_platform_src_Acme.Search
//! ```
//!
//! Absence of the file is handled by the caller (it means "no
//! subscriptions"); this module only distinguishes valid from malformed
//! content.

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Repository-relative location of the manifest, read at the default branch.
pub const MANIFEST_PATH: &str = ".extsync/subscriptions.yaml";

/// Parsed manifest. Unknown top-level fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionManifest {
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    subscriptions: Option<Vec<String>>,
}

impl SubscriptionManifest {
    /// Parse manifest bytes. `location` is only used in error messages.
    ///
    /// An empty document (or one holding only comments) yields an empty
    /// manifest; anything that is not a mapping with a string list is
    /// [`ManifestError::Parse`].
    pub fn parse(content: &[u8], location: &str) -> Result<Self, ManifestError> {
        let text = String::from_utf8_lossy(content);
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<RawManifest> =
            serde_yaml::from_str(&text).map_err(|source| ManifestError::Parse {
                location: location.to_string(),
                source,
            })?;
        Ok(Self {
            subscriptions: raw.and_then(|r| r.subscriptions).unwrap_or_default(),
        })
    }
}
