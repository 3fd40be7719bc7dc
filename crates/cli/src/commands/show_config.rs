//! Prints the effective configuration after defaults, files and environment are merged.

use anyhow::Result;
use clap::Args;

use super::spa_test::load_config;

/// Arguments for the config command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file path (defaults to config/Spa.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Profile overlay (config/Spa.{profile}.toml)
    #[arg(long, conflicts_with = "config")]
    pub profile: Option<String>,
}

pub fn run_show_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.profile.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
