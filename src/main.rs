use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use env_logger::{Builder, Env};
use fiber_orientation::{Config, Pipeline};

#[derive(Parser)]
#[command(author, version, about = "Structure tensor fiber orientation analysis")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: PathBuf,
}

fn main() -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    let cli = Cli::parse();
    let config = Config::from_path(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    Pipeline::new(&config).run()?;
    Ok(())
}
