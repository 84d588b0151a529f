//! Tree snapshots of a hosted directory.
//!
//! Both readers walk the tree with an explicit stack, so deep extension
//! directories never recurse. Relative paths always use `/` and are relative
//! to the directory passed in.

use std::collections::BTreeMap;

use extsync_core::host::{DirEntry, EntryKind, HostApi};

use crate::SyncError;

/// Source side: `(relative_path, content)` ordered by path.
pub type SourceFiles = Vec<(String, Vec<u8>)>;

/// Target side: relative path → revision marker.
pub type TargetMap = BTreeMap<String, String>;

/// Read every file under `dir` in the source repository at `git_ref`.
///
/// A missing or empty directory is [`SyncError::NothingToPublish`].
pub fn read_source_tree(
    host: &dyn HostApi,
    org: &str,
    repo: &str,
    dir: &str,
    git_ref: &str,
) -> Result<SourceFiles, SyncError> {
    let mut files = Vec::new();
    let found = walk(host, org, repo, dir, git_ref, |relative, entry| {
        let content = host.read_file(org, repo, &entry.path, git_ref)?;
        files.push((relative, content));
        Ok(())
    })?;
    if !found || files.is_empty() {
        return Err(SyncError::NothingToPublish {
            path: format!("{org}/{repo}:{}", trim(dir)),
        });
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::debug!("read {} source files from {org}/{repo}:{}", files.len(), trim(dir));
    Ok(files)
}

/// Read the revision marker of every file under `dir` in a target repository.
///
/// A missing directory is an empty map: the first sync creates it.
pub fn read_target_map(
    host: &dyn HostApi,
    org: &str,
    repo: &str,
    dir: &str,
    git_ref: &str,
) -> Result<TargetMap, SyncError> {
    let mut map = TargetMap::new();
    walk(host, org, repo, dir, git_ref, |relative, entry| {
        map.insert(relative, entry.sha.clone());
        Ok(())
    })?;
    Ok(map)
}

fn trim(dir: &str) -> &str {
    dir.trim_matches('/')
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Visit every file below `dir`. Returns `Ok(false)` if `dir` does not exist.
fn walk<F>(
    host: &dyn HostApi,
    org: &str,
    repo: &str,
    dir: &str,
    git_ref: &str,
    mut visit: F,
) -> Result<bool, SyncError>
where
    F: FnMut(String, &DirEntry) -> Result<(), SyncError>,
{
    let root = trim(dir).to_string();
    // (repository path, path relative to root)
    let mut pending = vec![(root.clone(), String::new())];

    while let Some((current, relative)) = pending.pop() {
        let entries = match host.list_directory(org, repo, &current, git_ref) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() && current == root => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let child = join(&relative, &entry.name);
            match entry.kind {
                EntryKind::Dir => pending.push((entry.path.clone(), child)),
                EntryKind::File => visit(child, &entry)?,
                EntryKind::Other => {
                    tracing::debug!("skipping non-file entry {}", entry.path);
                }
            }
        }
    }
    Ok(true)
}
