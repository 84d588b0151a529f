//! Serializable rendering payloads.

use serde::{Deserialize, Serialize};

/// Payload of the merge-proposal body template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalContext {
    pub extension_name: String,
    /// Resolved version string; `"unknown"` when nothing better exists.
    pub version: String,
    /// `org/repo` of the source repository.
    pub source: String,
    pub branch: String,
    pub release_url: Option<String>,
    /// Verbatim release notes; `None` renders a placeholder.
    pub release_notes: Option<String>,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
}

/// One line of the text report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub subscriber: String,
    pub detail: String,
}

/// Payload of the grouped text report template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    pub source: String,
    pub version: String,
    pub dry_run: bool,
    pub started_at: String,
    pub finished_at: String,
    pub duration: String,
    pub total: usize,
    pub success: Vec<ReportRow>,
    pub failed: Vec<ReportRow>,
    pub skipped: Vec<ReportRow>,
}
