//! `giftsync status`: what the persisted state holds per collection.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use giftsync_core::Config;
use giftsync_sync::{state_store, SyncState};

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct CollectionStatus {
    collection: String,
    /// `None` for collections present in state but no longer configured.
    range: Option<(u64, u64)>,
    stored: usize,
    coverage_percent: Option<f64>,
}

#[derive(Serialize)]
struct StatusReport {
    state_file: String,
    entities: usize,
    collections: Vec<CollectionStatus>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "collection")]
    collection: String,
    #[tabled(rename = "range")]
    range: String,
    #[tabled(rename = "stored")]
    stored: usize,
    #[tabled(rename = "coverage")]
    coverage: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let state = state_store::load_at(&config.output.state_file);
        let report = build_report(&config, &state);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

fn build_report(config: &Config, state: &SyncState) -> StatusReport {
    let stored = |name: &str| state.collection(name).map_or(0, |entries| entries.len());

    let mut collections: Vec<CollectionStatus> = config
        .collections
        .iter()
        .map(|spec| {
            let count = stored(&spec.name);
            let coverage = if spec.is_empty() {
                0.0
            } else {
                let in_range = state
                    .records(&spec.name)
                    .filter(|r| spec.ids().contains(&r.id))
                    .count();
                in_range as f64 * 100.0 / spec.len() as f64
            };
            CollectionStatus {
                collection: spec.name.clone(),
                range: Some((spec.start_id, spec.end_id)),
                stored: count,
                coverage_percent: Some((coverage * 10.0).round() / 10.0),
            }
        })
        .collect();

    let configured: BTreeSet<&str> = config.collections.iter().map(|c| c.name.as_str()).collect();
    for name in state.collections.keys() {
        if !configured.contains(name.as_str()) {
            collections.push(CollectionStatus {
                collection: name.clone(),
                range: None,
                stored: stored(name),
                coverage_percent: None,
            });
        }
    }

    StatusReport {
        state_file: config.output.state_file.display().to_string(),
        entities: state.len(),
        collections,
    }
}

fn print_table(report: StatusReport) {
    println!(
        "giftsync v{} | {} | {} entities",
        env!("CARGO_PKG_VERSION"),
        report.state_file,
        report.entities,
    );
    if report.entities == 0 {
        println!("{}", "No gifts synced yet. Run 'giftsync run --once'.".yellow());
    }

    let rows: Vec<StatusTableRow> = report
        .collections
        .into_iter()
        .map(|c| StatusTableRow {
            collection: c.collection,
            range: c
                .range
                .map_or_else(|| "not configured".bright_black().to_string(), |(s, e)| format!("{s}..={e}")),
            stored: c.stored,
            coverage: c
                .coverage_percent
                .map_or_else(|| "-".to_string(), |p| format!("{p:.1}%")),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftsync_core::{CollectionSpec, OutputConfig, SourceConfig};

    fn config(collections: Vec<CollectionSpec>) -> Config {
        Config {
            collections,
            poll_interval_secs: 60,
            concurrency: 10,
            sources: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn empty_state_reports_zero_coverage() {
        let report = build_report(
            &config(vec![CollectionSpec::new("PlushPepe", 1, 4)]),
            &SyncState::default(),
        );
        assert_eq!(report.entities, 0);
        assert_eq!(report.collections[0].stored, 0);
        assert_eq!(report.collections[0].coverage_percent, Some(0.0));
        assert_eq!(report.collections[0].range, Some((1, 4)));
    }
}
