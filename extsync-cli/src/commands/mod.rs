pub mod id;
pub mod plan;
pub mod publish;
pub mod subscribers;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use extsync_core::{config, RunConfig};

use crate::gitea::GiteaClient;

/// Connection and source options shared by every host-backed command.
///
/// Each value falls back to its environment variable, then to the config file.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Base URL of the hosting service.
    #[arg(long, env = "EXTSYNC_HOST_URL")]
    pub host_url: Option<String>,

    /// API token.
    #[arg(long, env = "EXTSYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Organisation owning the source repository.
    #[arg(long, env = "EXTSYNC_SOURCE_ORG")]
    pub source_org: Option<String>,

    /// Source repository name.
    #[arg(long, env = "EXTSYNC_SOURCE_REPO")]
    pub source_repo: Option<String>,

    /// Extension directory in the source repository (repeatable).
    #[arg(long = "path", value_name = "PATH")]
    pub extension_paths: Vec<String>,

    /// Config file to use instead of `~/.extsync/config.yaml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// File config with these arguments layered on top.
    pub fn resolve(&self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => config::load().context("failed to load ~/.extsync/config.yaml")?,
        };
        Ok(file.merge(RunConfig {
            host_url: self.host_url.clone(),
            token: self.token.clone(),
            source_org: self.source_org.clone(),
            source_repo: self.source_repo.clone(),
            extension_paths: self.extension_paths.clone(),
            ..RunConfig::default()
        }))
    }
}

pub fn connect(config: &RunConfig) -> GiteaClient {
    GiteaClient::new(config.host_url(), config.token())
}
