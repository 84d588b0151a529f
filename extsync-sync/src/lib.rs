//! # extsync-sync
//!
//! Extension publish engine.
//!
//! Call [`run`] to publish a release to every subscribed repository, or
//! [`preview`] to plan a single subscriber without mutating anything.

pub mod cancel;
pub mod commit;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod proposal;
pub mod report;
pub mod snapshot;

pub use cancel::CancelToken;
pub use diff::{diff_plan, FileDiff};
pub use discovery::find_subscribers;
pub use error::SyncError;
pub use pipeline::{preview, run, PublishRun, SubscriberPlan};
pub use report::{PublishReport, PublishResult, PublishStatus, ReportFormat, SyncResult};
