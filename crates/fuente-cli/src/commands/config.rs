//! Write or show the engine configuration file.

use super::common::load_config;
use anyhow::Context;
use clap::Args;
use fuente_config::{EngineConfig, default_engine_config_path};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write a default configuration to this file (or the user config path if empty)
    #[arg(long, value_name = "FILE.toml", num_args = 0..=1, default_missing_value = "")]
    init: Option<PathBuf>,

    /// Configuration file to show (defaults to the user config, then built-in defaults)
    #[arg(long, value_name = "FILE.toml", conflicts_with = "init")]
    show: Option<PathBuf>,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    if let Some(path) = args.init {
        let path = if path.as_os_str().is_empty() {
            default_engine_config_path()
        } else {
            path
        };
        EngineConfig::default()
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote default config");
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = load_config(args.show.as_ref())?;
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(())
}
