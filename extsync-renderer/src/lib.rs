//! # extsync-renderer
//!
//! Tera-based rendering of merge-proposal bodies and publish reports.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use extsync_renderer::{ProposalContext, Renderer};
//!
//! fn body(ctx: &ProposalContext) -> Option<String> {
//!     Renderer::new().ok()?.render_proposal(ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ProposalContext, ReportContext, ReportRow};
pub use engine::{Renderer, TemplateKind};
pub use error::RenderError;
