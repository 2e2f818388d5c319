//! `giftsync fetch`: one gift, straight from the sources.

use anyhow::{bail, Context, Result};
use clap::Args;

use giftsync_daemon::init_tracing;
use giftsync_source::HttpSource;
use giftsync_sync::{assemble_gift, content_hash, ArtifactLayout, GiftOutcome};

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Collection name, e.g. `PlushPepe`.
    pub collection: String,

    /// Gift id within the collection.
    pub id: u64,

    #[command(flatten)]
    pub config: ConfigArg,
}

impl FetchArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        init_tracing();
        let source = HttpSource::from_config(&config.sources);
        let layout = ArtifactLayout::from_config(&config.output);

        let record = match assemble_gift(&source, &self.collection, self.id, &layout) {
            GiftOutcome::Fetched(record) => record,
            GiftOutcome::Failed(failed) => {
                bail!("fetching {} failed ({:?} error)", failed.key, failed.kind)
            }
        };
        let hash = content_hash(&record).context("failed to hash record")?;

        println!(
            "{}",
            serde_json::to_string_pretty(&record).context("failed to serialize record")?
        );
        println!("content_hash: {hash}");
        Ok(())
    }
}
