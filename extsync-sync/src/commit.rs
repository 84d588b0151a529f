//! Atomic commit executor.

use extsync_core::host::{CommitRequest, HostApi};
use extsync_core::types::{ChangeOperation, CommitId, SubscribedRepository};

use crate::SyncError;

/// `update-<name>-<version>`: name lowercased with spaces as hyphens, one
/// leading `v` stripped from the version.
pub fn branch_name(extension_name: &str, version: &str) -> String {
    let name = extension_name.trim().to_lowercase().replace(' ', "-");
    let version = version.strip_prefix('v').unwrap_or(version);
    format!("update-{name}-{version}")
}

pub fn commit_message(extension_name: &str, version: &str) -> String {
    format!("chore(ext): update {extension_name} to {version}")
}

/// Apply `operations` to a new `branch` forked from the subscriber's default
/// branch, in a single host call.
///
/// An empty change set is rejected before touching the host.
pub fn execute(
    host: &dyn HostApi,
    subscriber: &SubscribedRepository,
    branch: &str,
    message: &str,
    operations: Vec<ChangeOperation>,
) -> Result<CommitId, SyncError> {
    if operations.is_empty() {
        return Err(SyncError::EmptyChangeSet);
    }
    let request = CommitRequest {
        organization: subscriber.organization.clone(),
        repository: subscriber.repository.clone(),
        base_branch: subscriber.target_branch.clone(),
        new_branch: branch.to_string(),
        message: message.to_string(),
        operations,
    };
    let commit = host.commit_changes(&request)?;
    tracing::info!(
        "committed {} operations to {}@{branch} ({commit})",
        request.operations.len(),
        subscriber.full_name()
    );
    Ok(commit)
}
