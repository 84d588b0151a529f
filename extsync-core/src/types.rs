//! Domain types shared by discovery, planning and publishing.
//!
//! Repository-relative paths are `String`s with `/` separators; they name
//! objects inside a hosted repository, never files on the local disk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;
use crate::identifier;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a commit created on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Subscription identifier
// ---------------------------------------------------------------------------

/// Logical form of a subscription identifier.
///
/// Serialises to and from the compact `org_repo_path_with_underscores` wire
/// form via [`identifier::encode`] / [`identifier::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SubscriptionId {
    pub organization: String,
    pub repository: String,
    pub extension_path: String,
}

impl SubscriptionId {
    pub fn new(
        organization: impl Into<String>,
        repository: impl Into<String>,
        extension_path: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            repository: repository.into(),
            extension_path: extension_path.into(),
        }
    }

    /// Wire form of this identifier.
    pub fn encoded(&self) -> String {
        identifier::encode(&self.organization, &self.repository, &self.extension_path)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

impl FromStr for SubscriptionId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        identifier::decode(s)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.encoded()
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        identifier::decode(&s)
    }
}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// A repository that declared a subscription to one of the source extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribedRepository {
    pub organization: String,
    pub repository: String,
    /// The subscriber's default branch; new branches fork from here.
    pub target_branch: String,
    /// Original, unescaped extension path in the source repository.
    pub target_directory: String,
    pub subscription_id: SubscriptionId,
}

impl SubscribedRepository {
    /// `org/repo` display form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }
}

// ---------------------------------------------------------------------------
// Change operations
// ---------------------------------------------------------------------------

/// Kind of a single file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// One file-level operation of an atomic commit.
///
/// `Update` and `Delete` always carry the target's current revision marker so
/// the host can reject the whole commit if the file moved underneath us.
/// `Create` never carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOperation {
    Create {
        path: String,
        content: Vec<u8>,
    },
    Update {
        path: String,
        content: Vec<u8>,
        revision_marker: String,
    },
    Delete {
        path: String,
        revision_marker: String,
    },
}

impl ChangeOperation {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeOperation::Create { .. } => ChangeKind::Create,
            ChangeOperation::Update { .. } => ChangeKind::Update,
            ChangeOperation::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// Absolute path inside the target repository.
    pub fn path(&self) -> &str {
        match self {
            ChangeOperation::Create { path, .. }
            | ChangeOperation::Update { path, .. }
            | ChangeOperation::Delete { path, .. } => path,
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        match self {
            ChangeOperation::Create { content, .. } | ChangeOperation::Update { content, .. } => {
                Some(content)
            }
            ChangeOperation::Delete { .. } => None,
        }
    }

    pub fn revision_marker(&self) -> Option<&str> {
        match self {
            ChangeOperation::Create { .. } => None,
            ChangeOperation::Update { revision_marker, .. }
            | ChangeOperation::Delete { revision_marker, .. } => Some(revision_marker),
        }
    }
}

// ---------------------------------------------------------------------------
// Release metadata
// ---------------------------------------------------------------------------

/// Release metadata of the source repository, looked up by tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_id_display_is_wire_form() {
        let id = SubscriptionId::new("acme", "platform", "src/Acme.Payments");
        assert_eq!(id.to_string(), "acme_platform_src_Acme.Payments");
    }

    #[test]
    fn subscription_id_serde_uses_wire_form() {
        let id = SubscriptionId::new("acme", "platform", "ext/billing");
        let yaml = serde_yaml::to_string(&id).expect("serialize");
        assert_eq!(yaml.trim(), "acme_platform_ext_billing");
        let back: SubscriptionId = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn subscription_id_serde_rejects_short_form() {
        let err = serde_yaml::from_str::<SubscriptionId>("acme_platform").unwrap_err();
        assert!(err.to_string().contains("invalid subscription identifier"));
    }

    #[test]
    fn operation_markers_follow_kind() {
        let create = ChangeOperation::Create {
            path: "a.txt".into(),
            content: b"a".to_vec(),
        };
        let delete = ChangeOperation::Delete {
            path: "b.txt".into(),
            revision_marker: "abc".into(),
        };
        assert_eq!(create.kind(), ChangeKind::Create);
        assert!(create.revision_marker().is_none());
        assert_eq!(delete.revision_marker(), Some("abc"));
        assert!(delete.content().is_none());
    }

    #[test]
    fn change_kind_display() {
        assert_eq!(ChangeKind::Update.to_string(), "update");
    }
}
