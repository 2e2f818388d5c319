//! giftsync: keep gift pages in step with their upstream sources.
//!
//! # Usage
//!
//! ```text
//! giftsync run [--config giftsync.yaml] [--once]
//! giftsync fetch <collection> <id> [--config giftsync.yaml]
//! giftsync status [--config giftsync.yaml] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{fetch::FetchArgs, run::RunArgs, status::StatusArgs};

#[derive(Parser, Debug)]
#[command(
    name = "giftsync",
    version,
    about = "Continuously sync gift records and republish the ones that changed",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync loop until Ctrl-C (or a single cycle with --once).
    Run(RunArgs),

    /// Fetch and merge one gift without persisting anything.
    Fetch(FetchArgs),

    /// Summarise the persisted sync state.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Fetch(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
