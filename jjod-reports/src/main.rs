//! Token report CLI.
//!
//! Writes `jjood-transfers-<time>.csv` and `jjod-holders-<time>.csv` for
//! the block `confirmation_depth` blocks below the chain tip.
//!
//! # Usage
//!
//! ```bash
//! # Report with built-in defaults (or ./config.toml if present)
//! jjod-reports
//!
//! # Report on a specific block, into ./out, with UTC timestamps
//! jjod-reports --block 18570000 --out-dir ./out --utc
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use jjod_reports::config::Config;
use jjod_reports::run;
use jjod_reports::units::Zone;
use jsearch::BlockTag;

/// Token transfer and holder CSV reports.
#[derive(Debug, Parser)]
#[command(name = "jjod-reports", version, about)]
struct Cli {
    /// Configuration file. Missing file means built-in defaults.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory to write the CSV files to.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Report on this block (number, hash or `latest`) instead of
    /// `latest - confirmation_depth`.
    #[arg(long)]
    block: Option<BlockTag>,

    /// Render timestamps in UTC instead of local time.
    #[arg(long)]
    utc: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(dir) = cli.out_dir {
        config.output_dir = dir;
    }
    if cli.utc {
        config.timezone = Zone::Utc;
    }

    run::run(&config, cli.block.as_ref()).await
}
