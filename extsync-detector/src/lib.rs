//! Project-layout detection for `extsync-detector`.
//!
//! `detect_layout(host, org, repo, ref)` inspects indicator files at the root
//! of a hosted repository and returns the project name that prefixes its
//! extension directories. Checks are ordered by specificity: solution and
//! crate manifests take priority over generic package manifests.
//!
//! Extension directories follow `<ProjectName>.<ExtensionDir>`; syncing from
//! `Acme.Payments` into a repository whose project is `Contoso` lands in
//! `Contoso.Payments` (see [`mirror_destination`]).

use extsync_core::error::HostError;
use extsync_core::host::{DirEntry, EntryKind, HostApi};
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detected layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// Definitive indicator (solution file, declared package name).
    High,
    /// Name inferred from a secondary indicator such as a project file stem.
    Medium,
}

/// A detected project layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Name used as the extension directory prefix.
    pub project_name: String,
    /// Ecosystem of the indicator file (e.g. `".NET"`, `"Rust"`).
    pub ecosystem: String,
    /// Repository-relative path of the indicator file.
    pub indicator: String,
    pub confidence: Confidence,
}

/// Errors from layout detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("could not determine project layout for '{repository}': no known indicator file found")]
    UnknownLayout { repository: String },
}

impl DetectError {
    /// `true` when the repository simply has no recognisable layout, as
    /// opposed to a failure while looking.
    pub fn is_unknown_layout(&self) -> bool {
        matches!(self, DetectError::UnknownLayout { .. })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the project layout of `org/repo` at `git_ref`.
///
/// Returns `DetectError::UnknownLayout` for an empty repository or one
/// without a known indicator file.
pub fn detect_layout(
    host: &dyn HostApi,
    org: &str,
    repo: &str,
    git_ref: &str,
) -> Result<ProjectLayout, DetectError> {
    let entries = match host.list_directory(org, repo, "", git_ref) {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Err(unknown(org, repo)),
        Err(e) => return Err(e.into()),
    };
    let root = Root { host, org, repo, git_ref, entries };

    if let Some(l) = detect_dotnet(&root) { return Ok(l); }
    if let Some(l) = detect_rust_crate(&root)? { return Ok(l); }
    if let Some(l) = detect_go(&root)? { return Ok(l); }
    if let Some(l) = detect_dart(&root)? { return Ok(l); }
    if let Some(l) = detect_javascript(&root)? { return Ok(l); }
    if let Some(l) = detect_python(&root)? { return Ok(l); }

    Err(unknown(org, repo))
}

/// Name of the extension directory with the source project prefix removed.
///
/// `extension_dir_name(Some("Acme"), "src/Acme.Payments") == "Payments"`.
/// Without a matching prefix the last path segment is returned unchanged.
pub fn extension_dir_name(source_project: Option<&str>, extension_path: &str) -> String {
    let leaf = split_leaf(extension_path).1;
    source_project
        .and_then(|p| leaf.strip_prefix(p))
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(leaf)
        .to_string()
}

/// Destination of `extension_path` inside a repository whose project is
/// `target_project`: the leaf `<sourceProject>.<dir>` becomes
/// `<targetProject>.<dir>` under the same parent directories.
pub fn mirror_destination(
    source_project: Option<&str>,
    target_project: &str,
    extension_path: &str,
) -> String {
    let (parent, _) = split_leaf(extension_path);
    let leaf = format!(
        "{target_project}.{}",
        extension_dir_name(source_project, extension_path)
    );
    match parent {
        Some(parent) => format!("{parent}/{leaf}"),
        None => leaf,
    }
}

fn split_leaf(path: &str) -> (Option<&str>, &str) {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, trimmed),
    }
}

fn unknown(org: &str, repo: &str) -> DetectError {
    DetectError::UnknownLayout { repository: format!("{org}/{repo}") }
}

// ---------------------------------------------------------------------------
// Root listing helper
// ---------------------------------------------------------------------------

struct Root<'a> {
    host: &'a dyn HostApi,
    org: &'a str,
    repo: &'a str,
    git_ref: &'a str,
    entries: Vec<DirEntry>,
}

impl Root<'_> {
    fn file(&self, name: &str) -> Option<&DirEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::File && e.name == name)
    }

    fn files_with_suffix(&self, suffix: &str) -> Vec<&DirEntry> {
        let mut found: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::File && e.name.ends_with(suffix))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    fn read(&self, entry: &DirEntry) -> Result<String, DetectError> {
        let bytes = self
            .host
            .read_file(self.org, self.repo, &entry.path, self.git_ref)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Ecosystem detectors
// ---------------------------------------------------------------------------

fn detect_dotnet(root: &Root<'_>) -> Option<ProjectLayout> {
    if let Some(sln) = root.files_with_suffix(".sln").first() {
        return Some(layout(stem(&sln.name, ".sln"), ".NET", sln, Confidence::High));
    }
    for suffix in [".csproj", ".fsproj"] {
        if let Some(proj) = root.files_with_suffix(suffix).first() {
            return Some(layout(stem(&proj.name, suffix), ".NET", proj, Confidence::Medium));
        }
    }
    None
}

fn detect_rust_crate(root: &Root<'_>) -> Result<Option<ProjectLayout>, DetectError> {
    let Some(file) = root.file("Cargo.toml") else { return Ok(None) };
    let manifest: CargoManifest = parse_toml(root, file)?;
    Ok(manifest
        .package
        .and_then(Named::into_name)
        .map(|name| layout(&name, "Rust", file, Confidence::High)))
}

fn detect_go(root: &Root<'_>) -> Result<Option<ProjectLayout>, DetectError> {
    let Some(file) = root.file("go.mod") else { return Ok(None) };
    let content = root.read(file)?;
    let module = content
        .lines()
        .find_map(|l| l.trim().strip_prefix("module "))
        .map(|m| m.split("//").next().unwrap_or(m).trim().trim_matches('"'))
        .and_then(go_project_name);
    Ok(module.map(|name| layout(name, "Go", file, Confidence::High)))
}

/// Last module path segment, skipping a major-version suffix such as `/v2`.
fn go_project_name(module: &str) -> Option<&str> {
    let mut segments = module.rsplit('/').filter(|s| !s.is_empty());
    let last = segments.next()?;
    if is_major_version(last) {
        segments.next()
    } else {
        Some(last)
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Deserialize)]
struct Named {
    name: Option<String>,
}

impl Named {
    fn into_name(self) -> Option<String> {
        self.name.filter(|n| !n.is_empty())
    }
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<Named>,
}

#[derive(Deserialize)]
struct PyProject {
    project: Option<Named>,
    tool: Option<PyTools>,
}

#[derive(Deserialize)]
struct PyTools {
    poetry: Option<Named>,
}

#[derive(Deserialize)]
struct Pubspec {
    name: Option<String>,
}

fn detect_dart(root: &Root<'_>) -> Result<Option<ProjectLayout>, DetectError> {
    let Some(file) = root.file("pubspec.yaml") else { return Ok(None) };
    let content = root.read(file)?;
    let spec: Pubspec = serde_yaml::from_str(&content).map_err(|e| DetectError::ParseError {
        path: file.path.clone(),
        message: e.to_string(),
    })?;
    Ok(spec
        .name
        .filter(|n| !n.is_empty())
        .map(|name| layout(&name, "Dart", file, Confidence::High)))
}

fn detect_javascript(root: &Root<'_>) -> Result<Option<ProjectLayout>, DetectError> {
    let Some(file) = root.file("package.json") else { return Ok(None) };
    let content = root.read(file)?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        DetectError::ParseError { path: file.path.clone(), message: e.to_string() }
    })?;

    // Scoped packages (`@acme/web`) contribute their unscoped name.
    let name = json
        .get("name")
        .and_then(|v| v.as_str())
        .map(|n| n.rsplit('/').next().unwrap_or(n))
        .filter(|n| !n.is_empty());
    Ok(name.map(|n| layout(n, "JavaScript", file, Confidence::High)))
}

fn detect_python(root: &Root<'_>) -> Result<Option<ProjectLayout>, DetectError> {
    let Some(file) = root.file("pyproject.toml") else { return Ok(None) };
    let pyproject: PyProject = parse_toml(root, file)?;
    let name = pyproject
        .project
        .and_then(Named::into_name)
        .or_else(|| pyproject.tool.and_then(|t| t.poetry).and_then(Named::into_name));
    Ok(name.map(|n| layout(&n, "Python", file, Confidence::High)))
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn layout(name: &str, ecosystem: &str, entry: &DirEntry, confidence: Confidence) -> ProjectLayout {
    ProjectLayout {
        project_name: name.to_string(),
        ecosystem: ecosystem.to_string(),
        indicator: entry.path.clone(),
        confidence,
    }
}

fn stem<'a>(name: &'a str, suffix: &str) -> &'a str {
    name.strip_suffix(suffix).unwrap_or(name)
}

fn parse_toml<T: serde::de::DeserializeOwned>(
    root: &Root<'_>,
    file: &DirEntry,
) -> Result<T, DetectError> {
    let content = root.read(file)?;
    toml::from_str(&content).map_err(|e| DetectError::ParseError {
        path: file.path.clone(),
        message: e.to_string(),
    })
}
