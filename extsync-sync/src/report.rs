//! Publication report: one entry per subscriber, in discovery order.
//!
//! Every count is derived from the result list, so
//! `success + failed + skipped == total` holds by construction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use extsync_core::host::MergeProposal;
use extsync_core::types::{CommitId, SubscribedRepository};
use extsync_renderer::{ReportContext, ReportRow, Renderer};

use crate::SyncError;

// ---------------------------------------------------------------------------
// Result entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Success,
    Failed,
    Skipped,
}

/// Outcome of planning and committing for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// `org/repo` of the subscriber.
    pub subscriber: String,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
    pub new_branch_name: String,
    pub commit_id: Option<CommitId>,
    pub error: Option<String>,
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Final state of one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub subscriber: SubscribedRepository,
    pub status: PublishStatus,
    /// Directory written in the subscriber, once resolved.
    pub destination: Option<String>,
    pub sync: Option<SyncResult>,
    pub proposal: Option<MergeProposal>,
    /// Why the subscriber failed or was skipped.
    pub reason: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl PublishResult {
    pub fn success(
        subscriber: SubscribedRepository,
        destination: String,
        sync: SyncResult,
        proposal: MergeProposal,
        duration: Duration,
    ) -> Self {
        Self {
            subscriber,
            status: PublishStatus::Success,
            destination: Some(destination),
            sync: Some(sync),
            proposal: Some(proposal),
            reason: None,
            duration,
        }
    }

    pub fn failed(
        subscriber: SubscribedRepository,
        reason: impl Into<String>,
        destination: Option<String>,
        sync: Option<SyncResult>,
        duration: Duration,
    ) -> Self {
        Self {
            subscriber,
            status: PublishStatus::Failed,
            destination,
            sync,
            proposal: None,
            reason: Some(reason.into()),
            duration,
        }
    }

    pub fn skipped(subscriber: SubscribedRepository, reason: impl Into<String>) -> Self {
        Self {
            subscriber,
            status: PublishStatus::Skipped,
            destination: None,
            sync: None,
            proposal: None,
            reason: Some(reason.into()),
            duration: Duration::ZERO,
        }
    }

    fn detail(&self) -> String {
        match (self.status, &self.proposal, &self.sync) {
            (PublishStatus::Success, Some(p), Some(s)) => format!(
                "#{} {}  {}: {} created, {} updated, {} deleted",
                p.number,
                p.url,
                self.destination.as_deref().unwrap_or("-"),
                s.files_created,
                s.files_updated,
                s.files_deleted
            ),
            _ => self.reason.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Output format of [`PublishReport::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        }
    }
}

/// Aggregated outcome of one publish run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// `org/repo` of the source.
    pub source: String,
    pub version: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    results: Vec<PublishResult>,
}

impl PublishReport {
    pub(crate) fn new(source: String, version: String, dry_run: bool) -> Self {
        Self {
            source,
            version,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: PublishResult) {
        debug_assert!(self.finished_at.is_none(), "report already finalized");
        self.results.push(result);
    }

    pub(crate) fn finalize(&mut self) {
        self.finished_at.get_or_insert_with(Utc::now);
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn results(&self) -> &[PublishResult] {
        &self.results
    }

    fn count(&self, status: PublishStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.count(PublishStatus::Success)
    }

    pub fn failed_count(&self) -> usize {
        self.count(PublishStatus::Failed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(PublishStatus::Skipped)
    }

    /// Skipped entries never count as errors.
    pub fn has_errors(&self) -> bool {
        self.failed_count() > 0
    }

    /// Sum of the per-subscriber durations.
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Render in `format`. The text form uses the report template of
    /// `renderer`.
    pub fn render(&self, format: ReportFormat, renderer: &Renderer) -> Result<String, SyncError> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(&self.json_view())?),
            ReportFormat::Text => Ok(renderer.render_report(&self.text_context())?),
        }
    }

    fn json_view(&self) -> JsonReport<'_> {
        JsonReport {
            summary: JsonSummary {
                total: self.total(),
                success: self.success_count(),
                failed: self.failed_count(),
                skipped: self.skipped_count(),
                duration_ms: u64::try_from(self.total_duration().as_millis()).unwrap_or(u64::MAX),
                started_at: self.started_at,
                finished_at: self.finished_at,
            },
            results: &self.results,
        }
    }

    fn text_context(&self) -> ReportContext {
        let rows = |status: PublishStatus| -> Vec<ReportRow> {
            self.results
                .iter()
                .filter(|r| r.status == status)
                .map(|r| ReportRow { subscriber: r.subscriber.full_name(), detail: r.detail() })
                .collect()
        };
        ReportContext {
            source: self.source.clone(),
            version: self.version.clone(),
            dry_run: self.dry_run,
            started_at: self.started_at.to_rfc3339(),
            finished_at: self
                .finished_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            duration: format!("{:.3}s", self.total_duration().as_secs_f64()),
            total: self.total(),
            success: rows(PublishStatus::Success),
            failed: rows(PublishStatus::Failed),
            skipped: rows(PublishStatus::Skipped),
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    success: usize,
    failed: usize,
    skipped: usize,
    duration_ms: u64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: JsonSummary,
    results: &'a [PublishResult],
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
