pub mod fetch;
pub mod run;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use giftsync_core::{config, Config};

/// `--config` shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Path to the YAML config file.
    #[arg(long, short, default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl ConfigArg {
    pub fn load(&self) -> Result<Config> {
        load_config(&self.config)
    }
}

fn load_config(path: &Path) -> Result<Config> {
    config::load_at(path).with_context(|| format!("invalid configuration in {}", path.display()))
}
