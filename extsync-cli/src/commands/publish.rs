//! `extsync publish`: push a release to every subscriber.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Args;

use extsync_core::RunConfig;
use extsync_sync::CancelToken;

use super::{connect, SourceArgs};

/// Arguments for `extsync publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Release tag to publish.
    #[arg(long, env = "EXTSYNC_RELEASE_TAG")]
    pub tag: Option<String>,

    /// Discover subscribers but change nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON.
    #[arg(long, env = "EXTSYNC_JSON_REPORT", value_parser = FalseyValueParser::new())]
    pub json: bool,

    /// Overall deadline in seconds; remaining subscribers are skipped.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory of `.tera` templates overriding the built-in ones.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.resolve()?.merge(RunConfig {
            release_tag: self.tag,
            dry_run: self.dry_run,
            json_report: self.json,
            timeout_secs: self.timeout,
            template_dir: self.templates,
            ..RunConfig::default()
        });
        config.validate().context("incomplete configuration")?;

        let cancel = CancelToken::new();
        let handler = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupted; finishing current subscriber");
            handler.cancel();
        })
        .context("failed to install Ctrl-C handler")?;

        let host = connect(&config);
        let run = extsync_sync::run(&host, &config, &cancel).context("publish failed")?;
        print!("{}", run.rendered);
        if !run.rendered.ends_with('\n') {
            println!();
        }
        run.status()?;
        Ok(())
    }
}
