//! `extsync subscribers`: who would receive a publish.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use extsync_core::SubscribedRepository;
use extsync_sync::find_subscribers;

use super::{connect, SourceArgs};

/// Arguments for `extsync subscribers`.
#[derive(Args, Debug)]
pub struct SubscribersArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct SubscriberRow {
    #[tabled(rename = "subscriber")]
    subscriber: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "extension")]
    extension: String,
    #[tabled(rename = "subscription id")]
    id: String,
}

#[derive(Serialize)]
struct SubscribersJson<'a> {
    source: String,
    count: usize,
    subscribers: &'a [SubscribedRepository],
}

impl SubscribersArgs {
    pub fn run(self) -> Result<()> {
        let config = self.source.resolve()?;
        config.validate_discovery().context("incomplete configuration")?;
        let source = format!("{}/{}", config.source_org(), config.source_repo());

        let host = connect(&config);
        let subscribers = find_subscribers(
            &host,
            config.source_org(),
            config.source_repo(),
            &config.extension_paths,
        )
        .context("subscriber discovery failed")?;

        if self.json {
            let payload = SubscribersJson {
                source,
                count: subscribers.len(),
                subscribers: &subscribers,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize subscribers")?
            );
            return Ok(());
        }

        println!("{} | {} subscribers", source.bold(), subscribers.len());
        if subscribers.is_empty() {
            println!("No subscribers found.");
            return Ok(());
        }
        let rows: Vec<SubscriberRow> = subscribers
            .into_iter()
            .map(|s| SubscriberRow {
                subscriber: s.full_name(),
                branch: s.target_branch,
                extension: s.target_directory,
                id: s.subscription_id.encoded(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
