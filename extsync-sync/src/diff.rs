//! Unified diffs of a [`SubscriberPlan`] for `extsync plan --diff`.

use similar::TextDiff;

use extsync_core::host::HostApi;
use extsync_core::types::ChangeOperation;

use crate::pipeline::SubscriberPlan;
use crate::SyncError;

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub unified_diff: String,
}

/// Compare every planned operation to the subscriber's current content.
///
/// Nothing is written. Files whose content would not change are omitted;
/// non-UTF-8 content is reported as a one-line binary notice.
pub fn diff_plan(host: &dyn HostApi, plan: &SubscriberPlan) -> Result<Vec<FileDiff>, SyncError> {
    let sub = &plan.subscriber;
    let mut diffs = Vec::new();

    for op in &plan.operations {
        let existing = match op {
            ChangeOperation::Create { .. } => Vec::new(),
            ChangeOperation::Update { path, .. } | ChangeOperation::Delete { path, .. } => {
                host.read_file(&sub.organization, &sub.repository, path, &sub.target_branch)?
            }
        };
        let proposed = op.content().unwrap_or_default();
        if existing == proposed {
            continue;
        }

        let unified_diff = match (std::str::from_utf8(&existing), std::str::from_utf8(proposed)) {
            (Ok(old), Ok(new)) => {
                let old = old.replace("\r\n", "\n");
                let new = new.replace("\r\n", "\n");
                TextDiff::from_lines(&old, &new)
                    .unified_diff()
                    .header(&format!("a/{}", op.path()), &format!("b/{}", op.path()))
                    .context_radius(3)
                    .to_string()
            }
            _ => format!("Binary file {} differs\n", op.path()),
        };
        diffs.push(FileDiff { path: op.path().to_string(), unified_diff });
    }
    Ok(diffs)
}
