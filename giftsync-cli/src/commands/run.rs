//! `giftsync run`: the sync loop.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use giftsync_daemon::{run_once_blocking, start_blocking, CollectionReport};

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "collection")]
    collection: String,
    #[tabled(rename = "changed")]
    changed: usize,
    #[tabled(rename = "unchanged")]
    unchanged: usize,
    #[tabled(rename = "failed")]
    failed: usize,
    #[tabled(rename = "published")]
    published: String,
    #[tabled(rename = "state")]
    state: String,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;

        if !self.once {
            return start_blocking(config).context("sync loop failed");
        }

        let reports = run_once_blocking(config).context("sync cycle failed")?;
        print_reports(&reports);
        Ok(())
    }
}

fn print_reports(reports: &[CollectionReport]) {
    let rows: Vec<ReportRow> = reports
        .iter()
        .map(|r| ReportRow {
            collection: r.collection.clone(),
            changed: r.changed,
            unchanged: r.unchanged,
            failed: r.failed,
            published: if r.publish_failures == 0 {
                r.published.to_string()
            } else {
                format!("{} ({} failed)", r.published, r.publish_failures)
            },
            state: if r.persisted {
                "saved".green().to_string()
            } else {
                "NOT SAVED".red().bold().to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let changed: usize = reports.iter().map(|r| r.changed).sum();
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    println!("✓ cycle complete ({changed} changed, {failed} failed)");
}
