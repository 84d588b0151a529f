//! Error types for extsync-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template loading and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Embedded or user templates failed to compile.
    #[error("failed to load templates: {0}")]
    Load(#[from] tera::Error),

    /// A compiled template failed against the supplied context.
    #[error("failed to render '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },

    /// The context could not be converted to a template value.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
