//! `extsync plan --org O --repo R`: preview the change set for one subscriber.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use extsync_core::{ChangeKind, RunConfig};
use extsync_sync::{diff_plan, find_subscribers, preview};

use super::{connect, SourceArgs};

/// Arguments for `extsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Subscriber organisation.
    #[arg(long)]
    pub org: String,

    /// Subscriber repository.
    #[arg(long)]
    pub repo: String,

    /// Release tag to plan against.
    #[arg(long, env = "EXTSYNC_RELEASE_TAG")]
    pub tag: Option<String>,

    /// Also print unified diffs of every change.
    #[arg(long)]
    pub diff: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let config = self
            .source
            .resolve()?
            .merge(RunConfig { release_tag: self.tag, ..RunConfig::default() });
        config.validate().context("incomplete configuration")?;

        let host = connect(&config);
        let matching: Vec<_> = find_subscribers(
            &host,
            config.source_org(),
            config.source_repo(),
            &config.extension_paths,
        )
        .context("subscriber discovery failed")?
        .into_iter()
        .filter(|s| s.organization == self.org && s.repository == self.repo)
        .collect();
        if matching.is_empty() {
            bail!(
                "{}/{} does not subscribe to any extension of {}/{}",
                self.org,
                self.repo,
                config.source_org(),
                config.source_repo()
            );
        }

        for subscriber in &matching {
            let Some(plan) = preview(&host, &config, subscriber)
                .with_context(|| format!("planning failed for {}", subscriber.full_name()))?
            else {
                println!(
                    "{} {}: unrecognised project layout, would be skipped",
                    "-".bright_black(),
                    subscriber.full_name()
                );
                continue;
            };

            println!(
                "{} -> {} on {} ({} operations)",
                subscriber.target_directory,
                plan.destination.bold(),
                plan.branch,
                plan.operations.len()
            );
            for op in &plan.operations {
                let marker = match op.kind() {
                    ChangeKind::Create => "+".green(),
                    ChangeKind::Update => "~".yellow(),
                    ChangeKind::Delete => "-".red(),
                };
                println!("  {marker}  {}", op.path());
            }

            if self.diff {
                for diff in diff_plan(&host, &plan).context("diff failed")? {
                    print!("{}", diff.unified_diff);
                    if !diff.unified_diff.ends_with('\n') {
                        println!();
                    }
                }
            }
        }
        Ok(())
    }
}
