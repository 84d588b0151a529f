//! Reconciliation planner: source snapshot + target markers → operations.

use std::collections::HashSet;

use extsync_core::types::ChangeOperation;

use crate::snapshot::TargetMap;

/// Plan the operations that make `destination_dir` mirror `source`.
///
/// - every source file becomes `Update` (with the target's marker) when the
///   target has it and `Create` otherwise, in source order;
/// - every target file missing from the source becomes `Delete`, sorted by
///   path, after all creates and updates;
/// - empty relative paths are dropped with a warning.
///
/// Unchanged files are still rewritten; content is never compared.
pub fn plan(
    source: &[(String, Vec<u8>)],
    target: &TargetMap,
    destination_dir: &str,
) -> Vec<ChangeOperation> {
    let destination = destination_dir.trim_matches('/');
    let absolute = |relative: &str| {
        if destination.is_empty() {
            relative.to_string()
        } else {
            format!("{destination}/{relative}")
        }
    };

    let mut ops = Vec::with_capacity(source.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(source.len());

    for (relative, content) in source {
        if relative.is_empty() {
            tracing::warn!("dropping source file with empty relative path");
            continue;
        }
        seen.insert(relative.as_str());
        let path = absolute(relative);
        let content = content.clone();
        ops.push(match target.get(relative) {
            Some(marker) => ChangeOperation::Update {
                path,
                content,
                revision_marker: marker.clone(),
            },
            None => ChangeOperation::Create { path, content },
        });
    }

    // BTreeMap iteration is already sorted by path.
    for (relative, marker) in target {
        if relative.is_empty() {
            tracing::warn!("dropping target entry with empty relative path");
            continue;
        }
        if !seen.contains(relative.as_str()) {
            ops.push(ChangeOperation::Delete {
                path: absolute(relative),
                revision_marker: marker.clone(),
            });
        }
    }
    ops
}
