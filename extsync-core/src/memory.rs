//! In-memory [`HostApi`] (testing and offline dry runs).
//!
//! Holds organisations, repositories and named refs (branches or tags), each
//! ref being a flat `path → bytes` tree. Revision markers are SHA-256 hex
//! digests of file content. `commit_changes` validates every operation
//! before touching anything, matching the host's all-or-nothing contract.
//!
//! Failure injection helpers make individual calls fail so the pipeline's
//! abort/continue policy can be exercised without a network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::HostError;
use crate::host::{
    CommitRequest, DirEntry, EntryKind, HostApi, MergeProposal, MergeProposalRequest, RepoInfo,
};
use crate::types::{ChangeOperation, CommitId, ReleaseInfo};

type RepoKey = (String, String);
type Tree = BTreeMap<String, Vec<u8>>;

/// SHA-256 hex digest used as the revision marker for `content`.
pub fn content_marker(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}

#[derive(Debug, Default)]
struct State {
    orgs: Vec<String>,
    repos: Vec<RepoInfo>,
    refs: HashMap<RepoKey, HashMap<String, Tree>>,
    releases: HashMap<(String, String, String), ReleaseInfo>,
    commits: Vec<CommitRequest>,
    proposals: Vec<MergeProposalRequest>,
    calls: usize,
    timeouts: Vec<Duration>,
    fail_org_listing: bool,
    fail_repo_listing: HashSet<String>,
    fail_reads: HashSet<RepoKey>,
    fail_commits: HashSet<RepoKey>,
    fail_proposals: HashSet<RepoKey>,
}

/// Thread-safe in-memory hosting service.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

fn key(org: &str, repo: &str) -> RepoKey {
    (org.to_string(), repo.to_string())
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Fixture builders
    // -----------------------------------------------------------------------

    /// Register `org/repo` with `default_branch` (created empty).
    pub fn add_repo(&self, org: &str, repo: &str, default_branch: &str) -> &Self {
        let mut st = self.lock();
        if !st.orgs.iter().any(|o| o == org) {
            st.orgs.push(org.to_string());
        }
        st.repos.push(RepoInfo {
            organization: org.to_string(),
            name: repo.to_string(),
            default_branch: default_branch.to_string(),
        });
        st.refs
            .entry(key(org, repo))
            .or_default()
            .entry(default_branch.to_string())
            .or_default();
        self
    }

    /// Register an organisation that owns no repositories.
    pub fn add_org(&self, org: &str) -> &Self {
        let mut st = self.lock();
        if !st.orgs.iter().any(|o| o == org) {
            st.orgs.push(org.to_string());
        }
        self
    }

    /// Write a file at `git_ref` (branch or tag), creating the ref if needed.
    pub fn put_file(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> &Self {
        self.lock()
            .refs
            .entry(key(org, repo))
            .or_default()
            .entry(git_ref.to_string())
            .or_default()
            .insert(normalize(path), content.into());
        self
    }

    pub fn add_release(&self, org: &str, repo: &str, release: ReleaseInfo) -> &Self {
        self.lock().releases.insert(
            (org.to_string(), repo.to_string(), release.tag_name.clone()),
            release,
        );
        self
    }

    pub fn fail_list_organizations(&self) -> &Self {
        self.lock().fail_org_listing = true;
        self
    }

    pub fn fail_list_repositories(&self, org: &str) -> &Self {
        self.lock().fail_repo_listing.insert(org.to_string());
        self
    }

    /// Every `read_file` / `list_directory` against `org/repo` fails with a
    /// transport error.
    pub fn fail_reads(&self, org: &str, repo: &str) -> &Self {
        self.lock().fail_reads.insert(key(org, repo));
        self
    }

    pub fn fail_commits(&self, org: &str, repo: &str) -> &Self {
        self.lock().fail_commits.insert(key(org, repo));
        self
    }

    pub fn fail_proposals(&self, org: &str, repo: &str) -> &Self {
        self.lock().fail_proposals.insert(key(org, repo));
        self
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Total number of [`HostApi`] calls served so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    pub fn commits(&self) -> Vec<CommitRequest> {
        self.lock().commits.clone()
    }

    pub fn proposals(&self) -> Vec<MergeProposalRequest> {
        self.lock().proposals.clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.lock().timeouts.clone()
    }

    /// Snapshot of every file at `git_ref`, or `None` if the ref is unknown.
    pub fn files(&self, org: &str, repo: &str, git_ref: &str) -> Option<BTreeMap<String, Vec<u8>>> {
        self.lock()
            .refs
            .get(&key(org, repo))
            .and_then(|refs| refs.get(git_ref))
            .cloned()
    }

    fn tree<'a>(
        st: &'a State,
        org: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<&'a Tree, HostError> {
        if st.fail_reads.contains(&key(org, repo)) {
            return Err(HostError::Transport(format!("injected read failure for {org}/{repo}")));
        }
        st.refs
            .get(&key(org, repo))
            .ok_or_else(|| HostError::NotFound(format!("repository {org}/{repo}")))?
            .get(git_ref)
            .ok_or_else(|| HostError::NotFound(format!("ref {git_ref} in {org}/{repo}")))
    }
}

fn validate(base: &Tree, op: &ChangeOperation) -> Result<(), HostError> {
    let current = base.get(op.path());
    match (op, current) {
        (ChangeOperation::Create { path, .. }, Some(_)) => {
            Err(HostError::Conflict(format!("{path} already exists")))
        }
        (ChangeOperation::Create { .. }, None) => Ok(()),
        (_, None) => Err(HostError::Conflict(format!("{} does not exist", op.path()))),
        (_, Some(content)) => {
            let marker = op.revision_marker().unwrap_or_default();
            if marker == content_marker(content) {
                Ok(())
            } else {
                Err(HostError::Conflict(format!("stale revision marker for {}", op.path())))
            }
        }
    }
}

impl HostApi for MemoryHost {
    fn list_organizations(&self) -> Result<Vec<String>, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        if st.fail_org_listing {
            return Err(HostError::Http {
                status: 500,
                message: "injected organisation listing failure".into(),
            });
        }
        Ok(st.orgs.clone())
    }

    fn list_repositories(&self, org: &str) -> Result<Vec<RepoInfo>, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        if st.fail_repo_listing.contains(org) {
            return Err(HostError::Http {
                status: 500,
                message: format!("injected repository listing failure for {org}"),
            });
        }
        if !st.orgs.iter().any(|o| o == org) {
            return Err(HostError::NotFound(format!("organization {org}")));
        }
        Ok(st
            .repos
            .iter()
            .filter(|r| r.organization == org)
            .cloned()
            .collect())
    }

    fn read_file(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        let path = normalize(path);
        Self::tree(&st, org, repo, git_ref)?
            .get(&path)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("{path} in {org}/{repo}@{git_ref}")))
    }

    fn list_directory(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<DirEntry>, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        let dir = normalize(path);
        let tree = Self::tree(&st, org, repo, git_ref)?;
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };

        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();
        for (file_path, content) in tree.range(prefix.clone()..) {
            let Some(rest) = file_path.strip_prefix(&prefix) else { break };
            let entry = match rest.split_once('/') {
                Some((name, _)) => DirEntry {
                    kind: EntryKind::Dir,
                    name: name.to_string(),
                    path: format!("{prefix}{name}"),
                    sha: String::new(),
                },
                None => DirEntry {
                    kind: EntryKind::File,
                    name: rest.to_string(),
                    path: file_path.clone(),
                    sha: content_marker(content),
                },
            };
            entries.entry(entry.name.clone()).or_insert(entry);
        }

        if entries.is_empty() && !dir.is_empty() {
            return Err(HostError::NotFound(format!("{dir} in {org}/{repo}@{git_ref}")));
        }
        Ok(entries.into_values().collect())
    }

    fn commit_changes(&self, request: &CommitRequest) -> Result<CommitId, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        let repo_key = key(&request.organization, &request.repository);
        if st.fail_commits.contains(&repo_key) {
            return Err(HostError::Http {
                status: 500,
                message: "injected commit failure".into(),
            });
        }

        let refs = st.refs.get(&repo_key).ok_or_else(|| {
            HostError::NotFound(format!(
                "repository {}/{}",
                request.organization, request.repository
            ))
        })?;
        if refs.contains_key(&request.new_branch) {
            return Err(HostError::Conflict(format!(
                "branch {} already exists",
                request.new_branch
            )));
        }
        let base = refs
            .get(&request.base_branch)
            .ok_or_else(|| HostError::NotFound(format!("branch {}", request.base_branch)))?;

        for op in &request.operations {
            validate(base, op)?;
        }

        let mut tree = base.clone();
        for op in &request.operations {
            match op {
                ChangeOperation::Create { path, content }
                | ChangeOperation::Update { path, content, .. } => {
                    tree.insert(path.clone(), content.clone());
                }
                ChangeOperation::Delete { path, .. } => {
                    tree.remove(path);
                }
            }
        }

        let seed = format!("{}:{}:{}", request.new_branch, request.message, st.commits.len());
        let commit_id = CommitId(content_marker(seed.as_bytes())[..40].to_string());
        st.refs
            .entry(repo_key)
            .or_default()
            .insert(request.new_branch.clone(), tree);
        st.commits.push(request.clone());
        Ok(commit_id)
    }

    fn create_merge_proposal(
        &self,
        request: &MergeProposalRequest,
    ) -> Result<MergeProposal, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        if st.fail_proposals.contains(&key(&request.organization, &request.repository)) {
            return Err(HostError::Http {
                status: 422,
                message: "injected merge proposal failure".into(),
            });
        }
        st.proposals.push(request.clone());
        let number = st.proposals.len() as u64;
        Ok(MergeProposal {
            number,
            url: format!(
                "memory://{}/{}/pulls/{number}",
                request.organization, request.repository
            ),
        })
    }

    fn get_release(&self, org: &str, repo: &str, tag: &str) -> Result<ReleaseInfo, HostError> {
        let mut st = self.lock();
        st.calls += 1;
        st.releases
            .get(&(org.to_string(), repo.to_string(), tag.to_string()))
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("release {tag} in {org}/{repo}")))
    }

    fn set_request_timeout(&self, timeout: Duration) {
        self.lock().timeouts.push(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> MemoryHost {
        let host = MemoryHost::new();
        host.add_repo("acme", "web", "main")
            .put_file("acme", "web", "main", "ext/a.txt", "a")
            .put_file("acme", "web", "main", "ext/sub/b.txt", "b");
        host
    }

    #[test]
    fn list_directory_groups_subdirectories() {
        let host = host();
        let entries = host.list_directory("acme", "web", "ext", "main").unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(names, vec![("a.txt", EntryKind::File), ("sub", EntryKind::Dir)]);
        assert_eq!(entries[0].sha, content_marker(b"a"));
    }

    #[test]
    fn list_directory_missing_is_not_found() {
        let err = host().list_directory("acme", "web", "nope", "main").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn stale_marker_rejects_whole_commit() {
        let host = host();
        let err = host
            .commit_changes(&CommitRequest {
                organization: "acme".into(),
                repository: "web".into(),
                base_branch: "main".into(),
                new_branch: "update".into(),
                message: "m".into(),
                operations: vec![
                    ChangeOperation::Create { path: "ext/new.txt".into(), content: b"n".to_vec() },
                    ChangeOperation::Delete {
                        path: "ext/a.txt".into(),
                        revision_marker: "stale".into(),
                    },
                ],
            })
            .unwrap_err();
        assert!(matches!(err, HostError::Conflict(_)));
        assert!(host.files("acme", "web", "update").is_none());
        assert!(host.commits().is_empty());
    }

    #[test]
    fn commit_creates_branch_from_base() {
        let host = host();
        host.commit_changes(&CommitRequest {
            organization: "acme".into(),
            repository: "web".into(),
            base_branch: "main".into(),
            new_branch: "update".into(),
            message: "m".into(),
            operations: vec![ChangeOperation::Update {
                path: "ext/a.txt".into(),
                content: b"a2".to_vec(),
                revision_marker: content_marker(b"a"),
            }],
        })
        .unwrap();
        let files = host.files("acme", "web", "update").unwrap();
        assert_eq!(files["ext/a.txt"], b"a2");
        assert_eq!(files["ext/sub/b.txt"], b"b");
        assert_eq!(host.files("acme", "web", "main").unwrap()["ext/a.txt"], b"a");
    }
}
