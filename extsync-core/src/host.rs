//! The narrow slice of the hosting service this engine consumes.
//!
//! Implementations: the HTTP adapter in the `extsync` binary and
//! [`MemoryHost`](crate::memory::MemoryHost) for tests. All calls are
//! blocking; a per-request timeout may be adjusted between subscribers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::types::{ChangeOperation, CommitId, ReleaseInfo};

/// A repository visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub organization: String,
    pub name: String,
    pub default_branch: String,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules; never synchronised.
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub kind: EntryKind,
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    /// Content hash; used as the revision marker.
    pub sha: String,
}

/// A single commit spanning many file operations on a new branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub organization: String,
    pub repository: String,
    /// Branch whose current head the new branch forks from.
    pub base_branch: String,
    pub new_branch: String,
    pub message: String,
    pub operations: Vec<ChangeOperation>,
}

/// A merge proposal to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeProposalRequest {
    pub organization: String,
    pub repository: String,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// An opened merge proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeProposal {
    pub number: u64,
    pub url: String,
}

/// Hosting-service operations used by discovery, snapshot reading, commits
/// and proposals.
pub trait HostApi {
    fn list_organizations(&self) -> Result<Vec<String>, HostError>;

    fn list_repositories(&self, org: &str) -> Result<Vec<RepoInfo>, HostError>;

    /// Raw bytes of the file at `path`. [`HostError::NotFound`] if absent.
    fn read_file(&self, org: &str, repo: &str, path: &str, git_ref: &str)
        -> Result<Vec<u8>, HostError>;

    /// Entries directly under `path`. [`HostError::NotFound`] if absent.
    fn list_directory(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<DirEntry>, HostError>;

    /// Create `new_branch` from `base_branch` and apply every operation in
    /// one commit. Nothing is applied if any revision marker is stale.
    fn commit_changes(&self, request: &CommitRequest) -> Result<CommitId, HostError>;

    fn create_merge_proposal(
        &self,
        request: &MergeProposalRequest,
    ) -> Result<MergeProposal, HostError>;

    fn get_release(&self, org: &str, repo: &str, tag: &str) -> Result<ReleaseInfo, HostError>;

    /// Bound each following request by `timeout`. Default: ignored.
    fn set_request_timeout(&self, _timeout: Duration) {}
}
