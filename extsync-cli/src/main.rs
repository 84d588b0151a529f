//! extsync: publish extension directories to subscribing repositories.
//!
//! # Usage
//!
//! ```text
//! extsync publish [--tag <tag>] [--path <dir>]... [--dry-run] [--json] [--timeout <secs>]
//! extsync subscribers [--path <dir>]... [--json]
//! extsync plan --org <org> --repo <repo> [--tag <tag>] [--diff]
//! extsync id encode --org <org> --repo <repo> --path <dir>
//! extsync id decode <id> [--json]
//! ```
//!
//! Connection settings come from flags, `EXTSYNC_*` environment variables or
//! `~/.extsync/config.yaml`, in that order of precedence.

mod commands;
mod gitea;
mod logging;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    id::IdCommand, plan::PlanArgs, publish::PublishArgs, subscribers::SubscribersArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "extsync",
    version,
    about = "Publish shared extension directories to subscribing repositories",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror the extension into every subscriber and open merge proposals.
    Publish(PublishArgs),

    /// List repositories subscribed to the source extensions.
    Subscribers(SubscribersArgs),

    /// Show the operations a publish would make in one subscriber.
    Plan(PlanArgs),

    /// Encode or decode subscription identifiers.
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    match cli.command {
        Commands::Publish(args) => args.run(),
        Commands::Subscribers(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Id { command } => commands::id::run(command),
    }
}
