//! End-to-end publish runs against an in-memory host.

use std::time::Duration;

use extsync_core::memory::content_marker;
use extsync_core::{MemoryHost, ReleaseInfo, RunConfig, MANIFEST_PATH};
use extsync_sync::{
    diff_plan, find_subscribers, preview, run, CancelToken, PublishStatus, SyncError,
};

const TAG: &str = "v1.2.0";
const EXT: &str = "src/Acme.Payments";
const MANIFEST: &str = "subscriptions:\n  - acme_platform_src_Acme.Payments\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> RunConfig {
    RunConfig {
        host_url: Some("memory://".into()),
        token: Some("token".into()),
        source_org: Some("acme".into()),
        source_repo: Some("platform".into()),
        extension_paths: vec![EXT.into()],
        release_tag: Some(TAG.into()),
        ..RunConfig::default()
    }
}

/// Source `acme/platform` plus `contoso/app`, an established .NET subscriber.
fn fixture() -> MemoryHost {
    init_logging();
    let host = MemoryHost::new();
    host.add_repo("acme", "platform", "main")
        .put_file("acme", "platform", TAG, "Acme.sln", "")
        .put_file("acme", "platform", TAG, "src/Acme.Payments/a.txt", "A2")
        .put_file("acme", "platform", TAG, "src/Acme.Payments/sub/b.txt", "B")
        .add_release(
            "acme",
            "platform",
            ReleaseInfo {
                tag_name: TAG.into(),
                body: Some("* Faster refunds".into()),
                html_url: Some("https://git.example.com/acme/platform/releases/tag/v1.2.0".into()),
                ..ReleaseInfo::default()
            },
        );
    host.add_repo("contoso", "app", "main")
        .put_file("contoso", "app", "main", MANIFEST_PATH, MANIFEST)
        .put_file("contoso", "app", "main", "Contoso.sln", "")
        .put_file("contoso", "app", "main", "src/Contoso.Payments/a.txt", "A1")
        .put_file("contoso", "app", "main", "src/Contoso.Payments/old.txt", "gone");
    host
}

fn add_subscriber(host: &MemoryHost, org: &str, sln: Option<&str>) {
    host.add_repo(org, "app", "main")
        .put_file(org, "app", "main", MANIFEST_PATH, MANIFEST);
    if let Some(sln) = sln {
        host.put_file(org, "app", "main", sln, "");
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[test]
fn publish_mirrors_extension_and_opens_proposal() {
    let host = fixture();
    let run = run(&host, &config(), &CancelToken::new()).expect("run");

    assert!(run.status().is_ok());
    assert_eq!(run.report.success_count(), 1);
    let result = &run.report.results()[0];
    assert_eq!(result.status, PublishStatus::Success);
    assert_eq!(result.destination.as_deref(), Some("src/Contoso.Payments"));

    let sync = result.sync.as_ref().expect("sync result");
    assert_eq!(
        (sync.files_created, sync.files_updated, sync.files_deleted),
        (1, 1, 1)
    );
    assert_eq!(sync.new_branch_name, "update-payments-1.2.0");

    let files = host
        .files("contoso", "app", "update-payments-1.2.0")
        .expect("branch created");
    assert_eq!(files["src/Contoso.Payments/a.txt"], b"A2");
    assert_eq!(files["src/Contoso.Payments/sub/b.txt"], b"B");
    assert!(!files.contains_key("src/Contoso.Payments/old.txt"));

    let commit = &host.commits()[0];
    assert_eq!(commit.message, "chore(ext): update Payments to v1.2.0");
    let proposal = &host.proposals()[0];
    assert_eq!(proposal.title, "Update Payments to v1.2.0");
    assert_eq!(proposal.base, "main");
    assert!(proposal.body.contains("* Faster refunds"));
}

#[test]
fn unchanged_files_are_still_committed() {
    let host = fixture();
    host.put_file("contoso", "app", "main", "src/Contoso.Payments/sub/b.txt", "B");
    let run = run(&host, &config(), &CancelToken::new()).expect("run");
    let sync = run.report.results()[0].sync.clone().expect("sync");
    assert_eq!(sync.files_updated, 2);
}

#[test]
fn json_report_is_parseable() {
    let host = fixture();
    let cfg = RunConfig { json_report: true, ..config() };
    let run = run(&host, &cfg, &CancelToken::new()).expect("run");
    let value: serde_json::Value = serde_json::from_str(&run.rendered).expect("json");
    assert_eq!(value["summary"]["success"], 1);
    assert_eq!(value["results"][0]["proposal"]["number"], 1);
}

// ---------------------------------------------------------------------------
// Per-subscriber outcomes
// ---------------------------------------------------------------------------

#[test]
fn mixed_outcomes_keep_discovery_order() {
    let host = fixture();
    add_subscriber(&host, "fabrikam", None);
    add_subscriber(&host, "tailspin", Some("Tailspin.sln"));
    add_subscriber(&host, "wingtip", Some("Wingtip.sln"));
    host.fail_commits("tailspin", "app")
        .fail_proposals("wingtip", "app");

    let run = run(&host, &config(), &CancelToken::new()).expect("run");
    let statuses: Vec<_> = run.report.results().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            PublishStatus::Success,
            PublishStatus::Skipped,
            PublishStatus::Failed,
            PublishStatus::Failed,
        ]
    );
    assert_eq!(
        run.report.results()[1].reason.as_deref(),
        Some("unrecognised project layout")
    );

    // Commit failed: no commit id. Proposal failed: commit id kept.
    let tailspin = run.report.results()[2].sync.as_ref().expect("sync");
    assert!(tailspin.commit_id.is_none());
    assert!(tailspin.error.is_some());
    let wingtip = run.report.results()[3].sync.as_ref().expect("sync");
    assert!(wingtip.commit_id.is_some());

    assert!(matches!(
        run.status(),
        Err(SyncError::SubscribersFailed { failed: 2, total: 4 })
    ));
    assert!(run.rendered.contains("FAILED (2)"));
}

#[test]
fn stale_branch_conflict_fails_only_that_subscriber() {
    let host = fixture();
    host.put_file("contoso", "app", "update-payments-1.2.0", "x", "y");
    add_subscriber(&host, "tailspin", Some("Tailspin.sln"));

    let run = run(&host, &config(), &CancelToken::new()).expect("run");
    assert_eq!(run.report.failed_count(), 1);
    assert_eq!(run.report.success_count(), 1);
}

#[test]
fn dry_run_skips_everything_without_mutation() {
    let host = fixture();
    let cfg = RunConfig { dry_run: true, ..config() };
    let run = run(&host, &cfg, &CancelToken::new()).expect("run");

    assert_eq!(run.report.skipped_count(), 1);
    assert!(run.status().is_ok());
    assert!(host.commits().is_empty());
    assert!(host.proposals().is_empty());
    assert!(run.rendered.starts_with("[dry-run]"));
}

#[test]
fn missing_source_directory_fails_subscriber() {
    let host = fixture();
    let cfg = RunConfig { extension_paths: vec!["src/Acme.Nothing".into()], ..config() };
    host.put_file(
        "contoso",
        "app",
        "main",
        MANIFEST_PATH,
        "subscriptions:\n  - acme_platform_src_Acme.Nothing\n",
    );
    let run = run(&host, &cfg, &CancelToken::new()).expect("run");
    let reason = run.report.results()[0].reason.clone().unwrap_or_default();
    assert!(reason.contains("nothing to publish"), "{reason}");
}

#[test]
fn empty_source_fails_even_when_destination_has_files() {
    let host = fixture();
    let cfg = RunConfig { extension_paths: vec!["src/Acme.Nothing".into()], ..config() };
    host.put_file(
        "contoso",
        "app",
        "main",
        MANIFEST_PATH,
        "subscriptions:\n  - acme_platform_src_Acme.Nothing\n",
    )
    .put_file("contoso", "app", "main", "src/Contoso.Nothing/keep.txt", "K")
    .put_file("contoso", "app", "main", "src/Contoso.Nothing/deep/more.txt", "M");

    let run = run(&host, &cfg, &CancelToken::new()).expect("run");
    let result = &run.report.results()[0];
    assert_eq!(result.status, PublishStatus::Failed);
    assert!(result.sync.as_ref().map_or(true, |s| s.commit_id.is_none()));
    assert!(host.commits().is_empty());
    assert!(host.proposals().is_empty());
    assert!(matches!(run.status(), Err(SyncError::SubscribersFailed { failed: 1, total: 1 })));
}

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

#[test]
fn target_analysis_failure_aborts_run() {
    let host = fixture();
    add_subscriber(&host, "broken", None);
    host.put_file("broken", "app", "main", "package.json", "{not json");
    add_subscriber(&host, "tailspin", Some("Tailspin.sln"));

    let err = run(&host, &config(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SyncError::Analysis { .. }), "{err}");
    assert_eq!(host.commits().len(), 1, "only the subscriber before the failure ran");
    assert!(host.files("tailspin", "app", "update-payments-1.2.0").is_none());
}

#[test]
fn corrupt_manifest_aborts_run() {
    let host = fixture();
    host.put_file("contoso", "app", "main", MANIFEST_PATH, "subscriptions: {oops");
    let err = run(&host, &config(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SyncError::Manifest(_)));
}

// ---------------------------------------------------------------------------
// Cancellation and deadlines
// ---------------------------------------------------------------------------

#[test]
fn cancelled_run_attempts_nothing() {
    let host = fixture();
    add_subscriber(&host, "tailspin", Some("Tailspin.sln"));
    let cancel = CancelToken::new();
    cancel.cancel();

    let run = run(&host, &config(), &cancel).expect("run");
    assert_eq!(run.report.skipped_count(), 2);
    for result in run.report.results() {
        assert_eq!(result.reason.as_deref(), Some("not attempted: run cancelled"));
    }
    assert!(host.commits().is_empty());
}

#[test]
fn deadline_sets_per_target_timeouts() {
    let host = fixture();
    add_subscriber(&host, "tailspin", Some("Tailspin.sln"));
    let cfg = RunConfig { timeout_secs: Some(600), ..config() };

    let run = run(&host, &cfg, &CancelToken::new()).expect("run");
    assert_eq!(run.report.success_count(), 2);
    let timeouts = host.timeouts();
    assert_eq!(timeouts.len(), 2);
    assert!(timeouts[0] <= Duration::from_secs(300));
    assert!(timeouts[1] > timeouts[0]);
}

#[test]
fn expired_deadline_skips_remaining() {
    let host = fixture();
    let cfg = RunConfig { timeout_secs: Some(0), ..config() };
    let run = run(&host, &cfg, &CancelToken::new()).expect("run");
    assert_eq!(
        run.report.results()[0].reason.as_deref(),
        Some("not attempted: run deadline exceeded")
    );
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[test]
fn preview_plans_without_mutation() {
    let host = fixture();
    let cfg = config();
    let subscribers = find_subscribers(&host, "acme", "platform", &cfg.extension_paths).unwrap();
    let plan = preview(&host, &cfg, &subscribers[0]).unwrap().expect("known layout");

    assert_eq!(plan.destination, "src/Contoso.Payments");
    assert_eq!(plan.operations.len(), 3);
    assert_eq!(
        plan.operations[0].revision_marker(),
        Some(content_marker(b"A1").as_str())
    );

    let diffs = diff_plan(&host, &plan).unwrap();
    assert!(diffs[0].unified_diff.contains("+A2"));
    assert!(host.commits().is_empty());
}
