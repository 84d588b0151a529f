//! Tera rendering engine: [`TemplateKind`] and [`Renderer`].
//!
//! | Template            | Used for                         |
//! |---------------------|----------------------------------|
//! | `merge_proposal.md` | Body of each opened merge request |
//! | `report.txt`        | Human-readable publish report     |
//!
//! Both are embedded at compile time; a user template directory may
//! override either by providing a file with the same name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::context::{ProposalContext, ReportContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("merge_proposal.md.tera", include_str!("templates/merge_proposal.md.tera")),
    ("report.txt.tera", include_str!("templates/report.txt.tera")),
];

/// Templates known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    MergeProposal,
    Report,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::MergeProposal, TemplateKind::Report]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::MergeProposal => "merge_proposal.md.tera",
            TemplateKind::Report => "report.txt.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| io_err(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
            if meta.is_dir() {
                pending.push(path);
            } else if meta.is_file() {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut templates = Vec::new();
    for path in collect_template_files(dir)? {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Tera-based renderer for merge-proposal bodies and reports.
///
/// Create once with [`Renderer::new`] (or [`Renderer::with_overrides`]) and
/// reuse for every subscriber.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Construct a [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Embedded templates plus any `.tera` overrides found in `dir`.
    pub fn with_overrides(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera(dir)? })
    }

    pub fn render_proposal(&self, ctx: &ProposalContext) -> Result<String, RenderError> {
        self.render(TemplateKind::MergeProposal, ctx)
    }

    pub fn render_report(&self, ctx: &ReportContext) -> Result<String, RenderError> {
        self.render(TemplateKind::Report, ctx)
    }

    fn render<T: Serialize>(&self, kind: TemplateKind, ctx: &T) -> Result<String, RenderError> {
        let name = kind.template_name();
        let render_err = |source| RenderError::Render { template: name.to_string(), source };
        let context = Context::from_value(serde_json::to_value(ctx)?).map_err(render_err)?;
        let rendered = self.tera.render(name, &context).map_err(render_err)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
