//! [`HostApi`] over the Gitea REST API (`/api/v1`), using blocking `ureq`.
//!
//! | Operation              | Endpoint                                        |
//! |------------------------|-------------------------------------------------|
//! | list organisations     | `GET /orgs`                                     |
//! | list repositories      | `GET /orgs/{org}/repos`                         |
//! | read file / list dir   | `GET /repos/{org}/{repo}/contents/{path}?ref=`  |
//! | multi-file commit      | `POST /repos/{org}/{repo}/contents`             |
//! | open merge proposal    | `POST /repos/{org}/{repo}/pulls`                |
//! | release by tag         | `GET /repos/{org}/{repo}/releases/tags/{tag}`   |

use std::sync::Mutex;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use extsync_core::error::HostError;
use extsync_core::host::{
    CommitRequest, DirEntry, EntryKind, HostApi, MergeProposal, MergeProposalRequest, RepoInfo,
};
use extsync_core::types::{ChangeOperation, CommitId, ReleaseInfo};

const PAGE_SIZE: usize = 50;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 200;

/// Blocking Gitea client authenticated with an API token.
pub struct GiteaClient {
    agent: ureq::Agent,
    api: String,
    token: String,
    timeout: Mutex<Duration>,
}

impl GiteaClient {
    /// `base_url` is the web root, e.g. `https://git.example.com`.
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            api: format!("{}/api/v1", base_url.trim_end_matches('/')),
            token: token.to_string(),
            timeout: Mutex::new(DEFAULT_TIMEOUT),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout.lock().map(|t| *t).unwrap_or(DEFAULT_TIMEOUT)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{path}", self.api))
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/json")
            .timeout(self.timeout())
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, HostError> {
        let mut req = self.request("GET", path);
        for (k, v) in query {
            req = req.query(k, v);
        }
        decode(req.call().map_err(map_error)?)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, HostError> {
        decode(self.request("POST", path).send_json(body).map_err(map_error)?)
    }

    /// Fetch every page of a listing endpoint.
    fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, HostError> {
        let limit = PAGE_SIZE.to_string();
        let mut out = Vec::new();
        for page in 1.. {
            let page = page.to_string();
            let batch: Vec<T> = self.get(path, &[("page", &page), ("limit", &limit)])?;
            let last = batch.len() < PAGE_SIZE;
            out.extend(batch);
            if last {
                break;
            }
        }
        Ok(out)
    }

    fn contents(&self, org: &str, repo: &str, path: &str, git_ref: &str) -> Result<Contents, HostError> {
        let path = path.trim_matches('/');
        let endpoint = if path.is_empty() {
            format!("/repos/{}/{}/contents", encode(org), encode(repo))
        } else {
            format!("/repos/{}/{}/contents/{}", encode(org), encode(repo), encode_path(path))
        };
        self.get(&endpoint, &[("ref", git_ref)])
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct OrgDto {
    username: String,
}

#[derive(Deserialize)]
struct OwnerDto {
    login: String,
}

#[derive(Deserialize)]
struct RepoDto {
    name: String,
    owner: OwnerDto,
    #[serde(default)]
    default_branch: String,
}

#[derive(Deserialize)]
struct ContentDto {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

/// The contents endpoint answers with an object for files and an array for
/// directories.
#[derive(Deserialize)]
#[serde(untagged)]
enum Contents {
    Dir(Vec<ContentDto>),
    File(ContentDto),
}

#[derive(Serialize)]
struct FileChangeDto<'a> {
    operation: &'static str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct ChangeFilesDto<'a> {
    branch: &'a str,
    new_branch: &'a str,
    message: &'a str,
    files: Vec<FileChangeDto<'a>>,
}

#[derive(Deserialize)]
struct CommitDto {
    sha: String,
}

#[derive(Deserialize)]
struct FilesResponseDto {
    commit: CommitDto,
}

#[derive(Serialize)]
struct PullDto<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Deserialize)]
struct PullResponseDto {
    number: u64,
    html_url: String,
}

fn change_dto(op: &ChangeOperation) -> FileChangeDto<'_> {
    FileChangeDto {
        operation: match op {
            ChangeOperation::Create { .. } => "create",
            ChangeOperation::Update { .. } => "update",
            ChangeOperation::Delete { .. } => "delete",
        },
        path: op.path(),
        content: op.content().map(|c| STANDARD.encode(c)),
        sha: op.revision_marker(),
    }
}

fn entry(dto: ContentDto) -> DirEntry {
    let kind = match dto.kind.as_str() {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        _ => EntryKind::Other,
    };
    DirEntry { kind, name: dto.name, path: dto.path, sha: dto.sha }
}

// ---------------------------------------------------------------------------
// HostApi
// ---------------------------------------------------------------------------

impl HostApi for GiteaClient {
    fn list_organizations(&self) -> Result<Vec<String>, HostError> {
        let orgs: Vec<OrgDto> = self.get_all("/orgs")?;
        Ok(orgs.into_iter().map(|o| o.username).collect())
    }

    fn list_repositories(&self, org: &str) -> Result<Vec<RepoInfo>, HostError> {
        let repos: Vec<RepoDto> = self.get_all(&format!("/orgs/{}/repos", encode(org)))?;
        Ok(repos
            .into_iter()
            .map(|r| RepoInfo {
                organization: r.owner.login,
                name: r.name,
                default_branch: if r.default_branch.is_empty() {
                    "main".to_string()
                } else {
                    r.default_branch
                },
            })
            .collect())
    }

    fn read_file(&self, org: &str, repo: &str, path: &str, git_ref: &str) -> Result<Vec<u8>, HostError> {
        match self.contents(org, repo, path, git_ref)? {
            Contents::File(file) => {
                let encoded: String = file
                    .content
                    .unwrap_or_default()
                    .split_whitespace()
                    .collect();
                STANDARD
                    .decode(encoded)
                    .map_err(|e| HostError::Decode(format!("{path}: {e}")))
            }
            Contents::Dir(_) => Err(HostError::NotFound(format!("{path} is a directory"))),
        }
    }

    fn list_directory(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<DirEntry>, HostError> {
        match self.contents(org, repo, path, git_ref)? {
            Contents::Dir(entries) => Ok(entries.into_iter().map(entry).collect()),
            Contents::File(_) => Err(HostError::NotFound(format!("{path} is a file"))),
        }
    }

    fn commit_changes(&self, request: &CommitRequest) -> Result<CommitId, HostError> {
        let body = ChangeFilesDto {
            branch: &request.base_branch,
            new_branch: &request.new_branch,
            message: &request.message,
            files: request.operations.iter().map(change_dto).collect(),
        };
        let path = format!(
            "/repos/{}/{}/contents",
            encode(&request.organization),
            encode(&request.repository)
        );
        let response: FilesResponseDto = self.post(&path, &body)?;
        Ok(CommitId(response.commit.sha))
    }

    fn create_merge_proposal(&self, request: &MergeProposalRequest) -> Result<MergeProposal, HostError> {
        let body = PullDto {
            title: &request.title,
            body: &request.body,
            head: &request.head,
            base: &request.base,
        };
        let path = format!(
            "/repos/{}/{}/pulls",
            encode(&request.organization),
            encode(&request.repository)
        );
        let response: PullResponseDto = self.post(&path, &body)?;
        Ok(MergeProposal { number: response.number, url: response.html_url })
    }

    fn get_release(&self, org: &str, repo: &str, tag: &str) -> Result<ReleaseInfo, HostError> {
        self.get(
            &format!("/repos/{}/{}/releases/tags/{}", encode(org), encode(repo), encode(tag)),
            &[],
        )
    }

    fn set_request_timeout(&self, timeout: Duration) {
        if let Ok(mut current) = self.timeout.lock() {
            *current = timeout;
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, HostError> {
    response
        .into_json()
        .map_err(|e| HostError::Decode(e.to_string()))
}

fn map_error(err: ureq::Error) -> HostError {
    match err {
        ureq::Error::Status(status, response) => {
            let url = response.get_url().to_string();
            let mut body = response.into_string().unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            status_error(status, format!("{url}: {body}"))
        }
        ureq::Error::Transport(t) => HostError::Transport(t.to_string()),
    }
}

fn status_error(status: u16, message: String) -> HostError {
    match status {
        404 => HostError::NotFound(message),
        409 | 422 => HostError::Conflict(message),
        _ => HostError::Http { status, message },
    }
}

/// Percent-encode one path segment. `ureq` only encodes query pairs, so URL
/// paths are built here segment by segment and the `/` separators survive.
fn encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn encode_path(path: &str) -> String {
    path.split('/').map(encode).collect::<Vec<_>>().join("/")
}
