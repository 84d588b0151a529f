//! Parameterised layout detection tests for `extsync-detector`.
//!
//! Each `#[case]` gets an isolated `MemoryHost`: no shared state.

use extsync_core::MemoryHost;
use extsync_detector::{detect_layout, Confidence, DetectError};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn repo_with(files: &[(&str, &str)]) -> MemoryHost {
    let host = MemoryHost::new();
    host.add_repo("contoso", "app", "main");
    for (path, content) in files {
        host.put_file("contoso", "app", "main", path, *content);
    }
    host
}

fn detect(host: &MemoryHost) -> Result<extsync_detector::ProjectLayout, DetectError> {
    detect_layout(host, "contoso", "app", "main")
}

// ---------------------------------------------------------------------------
// Ecosystems
// ---------------------------------------------------------------------------

#[rstest]
#[case("Contoso.sln", "", "Contoso", ".NET")]
#[case("Cargo.toml", "[package]\nname = \"contoso\"\n", "contoso", "Rust")]
#[case("Cargo.toml", "[package]\nname = \"contoso\" # the app\n", "contoso", "Rust")]
#[case("Cargo.toml", "package = { name = \"inline\" }\n", "inline", "Rust")]
#[case("Cargo.toml", "package.name = \"dotted\"\n", "dotted", "Rust")]
#[case("go.mod", "module github.com/contoso/shop\n\ngo 1.22\n", "shop", "Go")]
#[case("go.mod", "module github.com/contoso/shop/v2\n\ngo 1.22\n", "shop", "Go")]
#[case("pubspec.yaml", "name: contoso_mobile\n", "contoso_mobile", "Dart")]
#[case("package.json", r#"{"name": "@contoso/web"}"#, "web", "JavaScript")]
#[case("pyproject.toml", "[project]\nname = \"contoso-ml\"\n", "contoso-ml", "Python")]
#[case("pyproject.toml", "[tool.poetry]\nname = \"poetry-app\"\n", "poetry-app", "Python")]
fn ecosystem_detection(
    #[case] file: &str,
    #[case] content: &str,
    #[case] name: &str,
    #[case] ecosystem: &str,
) {
    let host = repo_with(&[(file, content)]);
    let layout = detect(&host).expect("detect");
    assert_eq!(layout.project_name, name);
    assert_eq!(layout.ecosystem, ecosystem);
    assert_eq!(layout.indicator, file);
    assert_eq!(layout.confidence, Confidence::High);
}

#[test]
fn csproj_stem_is_medium_confidence() {
    let host = repo_with(&[("Contoso.Web.csproj", "<Project />")]);
    let layout = detect(&host).expect("detect");
    assert_eq!(layout.project_name, "Contoso.Web");
    assert_eq!(layout.confidence, Confidence::Medium);
}

#[test]
fn solution_wins_over_package_json() {
    let host = repo_with(&[
        ("package.json", r#"{"name": "frontend"}"#),
        ("Contoso.sln", ""),
    ]);
    assert_eq!(detect(&host).expect("detect").project_name, "Contoso");
}

#[test]
fn workspace_only_cargo_falls_through() {
    let host = repo_with(&[
        ("Cargo.toml", "[workspace]\nmembers = [\"a\"]\n"),
        ("package.json", r#"{"name": "site"}"#),
    ]);
    let layout = detect(&host).expect("detect");
    assert_eq!(layout.ecosystem, "JavaScript");
}

// ---------------------------------------------------------------------------
// Unknown vs hard failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_layout_for_plain_repo() {
    let host = repo_with(&[("README.md", "# hi")]);
    let err = detect(&host).unwrap_err();
    assert!(err.is_unknown_layout(), "got: {err}");
    assert!(err.to_string().contains("contoso/app"));
}

#[test]
fn empty_repository_is_unknown_layout() {
    let host = repo_with(&[]);
    assert!(detect(&host).unwrap_err().is_unknown_layout());
}

#[test]
fn malformed_package_json_is_hard_error() {
    let host = repo_with(&[("package.json", "{ not json")]);
    let err = detect(&host).unwrap_err();
    assert!(matches!(err, DetectError::ParseError { .. }), "got: {err}");
    assert!(!err.is_unknown_layout());
}

#[test]
fn malformed_cargo_toml_is_hard_error() {
    let host = repo_with(&[("Cargo.toml", "[package\nname = ")]);
    let err = detect(&host).unwrap_err();
    assert!(matches!(err, DetectError::ParseError { ref path, .. } if path == "Cargo.toml"), "got: {err}");
}

#[test]
fn host_failure_is_hard_error() {
    let host = repo_with(&[("Contoso.sln", "")]);
    host.fail_reads("contoso", "app");
    let err = detect(&host).unwrap_err();
    assert!(matches!(err, DetectError::Host(_)), "got: {err}");
}

#[test]
fn detection_reads_only_root_listing_for_solutions() {
    let host = repo_with(&[("Contoso.sln", ""), ("src/Contoso.Payments/a.cs", "")]);
    detect(&host).expect("detect");
    assert_eq!(host.call_count(), 1);
}
