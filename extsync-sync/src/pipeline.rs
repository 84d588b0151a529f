//! Publish pipeline shared by `extsync publish`, `extsync plan` and tests.
//!
//! ## Run states
//!
//! 1. **Init**: validate [`RunConfig`]; nothing touches the host before this.
//! 2. **ReleaseResolved**: fetch the release by tag and analyse the source
//!    project layout.
//! 3. **SubscribersDiscovered**: run discovery; zero subscribers is success.
//! 4. **Per subscriber** (sequential, discovery order): skipped when the run
//!    was cancelled, ran out of time, or is a dry run; otherwise analyse the
//!    target layout, plan, commit and open a merge proposal.
//! 5. **ReportFinalized**: stamp end time and render.
//!
//! Fatal errors (configuration, release lookup, organisation listing,
//! malformed manifest, failed layout analysis) end the run with `Err`.
//! Everything else lands in the report.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

use extsync_core::host::HostApi;
use extsync_core::types::{ChangeKind, ChangeOperation, ReleaseInfo, SubscribedRepository};
use extsync_core::RunConfig;
use extsync_detector::{detect_layout, extension_dir_name, mirror_destination};
use extsync_renderer::Renderer;

use crate::cancel::{stop_reason, CancelToken, RunBudget};
use crate::discovery::find_subscribers;
use crate::report::{PublishReport, PublishResult, ReportFormat, SyncResult};
use crate::snapshot::{read_source_tree, read_target_map, SourceFiles};
use crate::{commit, planner, proposal, SyncError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A finished run: the report and its rendered form.
#[derive(Debug)]
pub struct PublishRun {
    pub report: PublishReport,
    pub rendered: String,
}

impl PublishRun {
    /// `Err(SubscribersFailed)` iff at least one subscriber failed.
    pub fn status(&self) -> Result<(), SyncError> {
        if self.report.has_errors() {
            Err(SyncError::SubscribersFailed {
                failed: self.report.failed_count(),
                total: self.report.total(),
            })
        } else {
            Ok(())
        }
    }
}

/// What a publish would do to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberPlan {
    pub subscriber: SubscribedRepository,
    pub extension_name: String,
    pub destination: String,
    pub branch: String,
    pub operations: Vec<ChangeOperation>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Publish the configured release to every subscriber.
///
/// `Err` means the run aborted before a report existed. A completed run
/// returns `Ok` even when subscribers failed so the report can still be
/// printed; [`PublishRun::status`] turns it into the aggregate
/// `SubscribersFailed` error and callers must check it.
#[must_use = "check `PublishRun::status` for failed subscribers"]
pub fn run(
    host: &dyn HostApi,
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<PublishRun, SyncError> {
    config.validate()?;
    let renderer = Renderer::with_overrides(config.template_dir.as_deref())?;
    let (org, repo, tag) = (config.source_org(), config.source_repo(), config.release_tag());
    let source = format!("{org}/{repo}");

    let release = host
        .get_release(org, repo, tag)
        .map_err(|source| SyncError::Release { tag: tag.to_string(), source })?;
    let source_project = detect_project(host, org, repo, tag)?;
    tracing::info!(
        "publishing {source}@{tag} (project {})",
        source_project.as_deref().unwrap_or("unrecognised")
    );

    let subscribers = find_subscribers(host, org, repo, &config.extension_paths)?;
    let total = subscribers.len();
    let mut report = PublishReport::new(source.clone(), tag.to_string(), config.dry_run);
    let budget = RunBudget::new(config.timeout());

    let mut publisher = Publisher {
        host,
        renderer: &renderer,
        source: &source,
        config,
        release: &release,
        source_project: source_project.as_deref(),
        source_files: HashMap::new(),
    };

    for (index, subscriber) in subscribers.into_iter().enumerate() {
        if let Some(reason) = stop_reason(cancel, &budget) {
            tracing::warn!("{}: {reason}", subscriber.full_name());
            report.push(PublishResult::skipped(subscriber, reason));
            continue;
        }
        if let Some(timeout) = budget.per_target(total - index) {
            host.set_request_timeout(timeout);
        }
        if config.dry_run {
            tracing::info!("[dry-run] would publish to {}", subscriber.full_name());
            report.push(PublishResult::skipped(subscriber, "dry run"));
            continue;
        }
        match publisher.publish_one(subscriber) {
            Ok(result) => report.push(result),
            Err(e) => {
                tracing::error!("aborting run after {index} of {total} subscribers: {e}");
                return Err(e);
            }
        }
    }

    report.finalize();
    let rendered = report.render(ReportFormat::from_json_flag(config.json_report), &renderer)?;
    tracing::info!(
        "publish finished: {} success, {} failed, {} skipped",
        report.success_count(),
        report.failed_count(),
        report.skipped_count()
    );
    Ok(PublishRun { report, rendered })
}

/// Plan one subscriber without mutating anything.
///
/// `Ok(None)` when the subscriber's project layout is unrecognised.
pub fn preview(
    host: &dyn HostApi,
    config: &RunConfig,
    subscriber: &SubscribedRepository,
) -> Result<Option<SubscriberPlan>, SyncError> {
    config.validate()?;
    let (org, repo, tag) = (config.source_org(), config.source_repo(), config.release_tag());
    let source_project = detect_project(host, org, repo, tag)?;
    let Some(target) = resolve_target(host, source_project.as_deref(), subscriber)? else {
        return Ok(None);
    };

    let files = read_source_tree(host, org, repo, &subscriber.target_directory, tag)?;
    let existing = read_target_map(
        host,
        &subscriber.organization,
        &subscriber.repository,
        &target.destination,
        &subscriber.target_branch,
    )?;
    Ok(Some(SubscriberPlan {
        subscriber: subscriber.clone(),
        branch: commit::branch_name(&target.extension_name, tag),
        operations: planner::plan(&files, &existing, &target.destination),
        extension_name: target.extension_name,
        destination: target.destination,
    }))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

struct Target {
    extension_name: String,
    destination: String,
}

fn detect_project(
    host: &dyn HostApi,
    org: &str,
    repo: &str,
    git_ref: &str,
) -> Result<Option<String>, SyncError> {
    match detect_layout(host, org, repo, git_ref) {
        Ok(layout) => {
            tracing::debug!("{org}/{repo}: {} project via {}", layout.ecosystem, layout.indicator);
            Ok(Some(layout.project_name))
        }
        Err(e) if e.is_unknown_layout() => Ok(None),
        Err(source) => Err(SyncError::Analysis { repository: format!("{org}/{repo}"), source }),
    }
}

fn resolve_target(
    host: &dyn HostApi,
    source_project: Option<&str>,
    subscriber: &SubscribedRepository,
) -> Result<Option<Target>, SyncError> {
    let project = detect_project(
        host,
        &subscriber.organization,
        &subscriber.repository,
        &subscriber.target_branch,
    )?;
    Ok(project.map(|project| Target {
        extension_name: extension_dir_name(source_project, &subscriber.target_directory),
        destination: mirror_destination(source_project, &project, &subscriber.target_directory),
    }))
}

struct Publisher<'a> {
    host: &'a dyn HostApi,
    renderer: &'a Renderer,
    source: &'a str,
    config: &'a RunConfig,
    release: &'a ReleaseInfo,
    source_project: Option<&'a str>,
    /// Source trees by extension path, read once per run.
    source_files: HashMap<String, SourceFiles>,
}

impl Publisher<'_> {
    /// `Err` only for failures that abort the whole run.
    fn publish_one(&mut self, subscriber: SubscribedRepository) -> Result<PublishResult, SyncError> {
        let started = Instant::now();
        let Some(target) = resolve_target(self.host, self.source_project, &subscriber)? else {
            tracing::warn!("{}: unrecognised project layout, skipping", subscriber.full_name());
            return Ok(PublishResult::skipped(subscriber, "unrecognised project layout"));
        };

        let tag = self.config.release_tag();
        let branch = commit::branch_name(&target.extension_name, tag);
        let mut sync = SyncResult {
            subscriber: subscriber.full_name(),
            files_created: 0,
            files_updated: 0,
            files_deleted: 0,
            new_branch_name: branch.clone(),
            commit_id: None,
            error: None,
        };

        if let Err(e) = self.sync_files(&subscriber, &target, &mut sync) {
            tracing::error!("{}: {e}", subscriber.full_name());
            sync.error = Some(e.to_string());
            return Ok(PublishResult::failed(
                subscriber,
                e.to_string(),
                Some(target.destination),
                Some(sync),
                started.elapsed(),
            ));
        }

        let input = proposal::ProposalInput {
            extension_name: &target.extension_name,
            version: tag,
            source: self.source,
            branch: &branch,
            release: Some(self.release),
            files_created: sync.files_created,
            files_updated: sync.files_updated,
            files_deleted: sync.files_deleted,
        };
        match proposal::publish(self.host, self.renderer, &subscriber, &input) {
            Ok(opened) => Ok(PublishResult::success(
                subscriber,
                target.destination,
                sync,
                opened,
                started.elapsed(),
            )),
            Err(e) => {
                tracing::error!("{}: {e}", subscriber.full_name());
                Ok(PublishResult::failed(
                    subscriber,
                    e.to_string(),
                    Some(target.destination),
                    Some(sync),
                    started.elapsed(),
                ))
            }
        }
    }

    fn sync_files(
        &mut self,
        subscriber: &SubscribedRepository,
        target: &Target,
        sync: &mut SyncResult,
    ) -> Result<(), SyncError> {
        let (host, config) = (self.host, self.config);
        let (org, repo, tag) = (config.source_org(), config.source_repo(), config.release_tag());
        let files = match self.source_files.entry(subscriber.target_directory.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                e.insert(read_source_tree(host, org, repo, &subscriber.target_directory, tag)?)
            }
        };
        let existing = read_target_map(
            host,
            &subscriber.organization,
            &subscriber.repository,
            &target.destination,
            &subscriber.target_branch,
        )?;
        let operations = planner::plan(files, &existing, &target.destination);
        for op in &operations {
            match op.kind() {
                ChangeKind::Create => sync.files_created += 1,
                ChangeKind::Update => sync.files_updated += 1,
                ChangeKind::Delete => sync.files_deleted += 1,
            }
        }

        let message = commit::commit_message(&target.extension_name, tag);
        let commit_id =
            commit::execute(host, subscriber, &sync.new_branch_name, &message, operations)?;
        sync.commit_id = Some(commit_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsync_core::memory::MemoryHost;

    fn config() -> RunConfig {
        RunConfig {
            host_url: Some("memory://".into()),
            token: Some("t".into()),
            source_org: Some("acme".into()),
            source_repo: Some("platform".into()),
            extension_paths: vec!["src/Acme.Payments".into()],
            release_tag: Some("v1.0.0".into()),
            ..RunConfig::default()
        }
    }

    #[test]
    fn invalid_config_makes_no_host_call() {
        let host = MemoryHost::new();
        let cfg = RunConfig { release_tag: None, ..config() };
        let err = run(&host, &cfg, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert_eq!(host.call_count(), 0);
    }

    #[test]
    fn missing_release_is_fatal() {
        let host = MemoryHost::new();
        host.add_repo("acme", "platform", "main");
        let err = run(&host, &config(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SyncError::Release { .. }));
    }

    #[test]
    fn zero_subscribers_is_success() {
        let host = MemoryHost::new();
        host.add_repo("acme", "platform", "main").add_release(
            "acme",
            "platform",
            ReleaseInfo { tag_name: "v1.0.0".into(), ..ReleaseInfo::default() },
        );
        let run = run(&host, &config(), &CancelToken::new()).unwrap();
        assert_eq!(run.report.total(), 0);
        assert!(run.status().is_ok());
        assert!(run.rendered.contains("No subscribers found."));
    }

    #[test]
    fn status_reports_failures() {
        let mut report = PublishReport::new("a/b".into(), "v1".into(), false);
        let sub = SubscribedRepository {
            organization: "o".into(),
            repository: "r".into(),
            target_branch: "main".into(),
            target_directory: "d".into(),
            subscription_id: extsync_core::SubscriptionId::new("a", "b", "d"),
        };
        report.push(PublishResult::failed(sub, "boom", None, None, Default::default()));
        let run = PublishRun { report, rendered: String::new() };
        assert!(matches!(
            run.status(),
            Err(SyncError::SubscribersFailed { failed: 1, total: 1 })
        ));
    }
}
