//! `extsync id encode|decode`: subscription identifier codec.

use anyhow::{Context, Result};
use clap::Subcommand;

use extsync_core::{identifier, SubscriptionId};

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Print the identifier a subscriber lists in its manifest.
    Encode {
        #[arg(long)]
        org: String,
        #[arg(long)]
        repo: String,
        /// Extension directory inside the source repository.
        #[arg(long)]
        path: String,
    },

    /// Split an identifier into organisation, repository and path.
    Decode {
        id: String,

        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: IdCommand) -> Result<()> {
    match command {
        IdCommand::Encode { org, repo, path } => {
            println!("{}", identifier::encode(&org, &repo, &path));
        }
        IdCommand::Decode { id, json } => {
            let decoded: SubscriptionId = id.parse()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "organization": decoded.organization,
                        "repository": decoded.repository,
                        "extension_path": decoded.extension_path,
                    }))
                    .context("failed to serialize identifier")?
                );
            } else {
                println!("organization:   {}", decoded.organization);
                println!("repository:     {}", decoded.repository);
                println!("extension path: {}", decoded.extension_path);
            }
        }
    }
    Ok(())
}
