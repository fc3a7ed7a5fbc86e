//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Download a radio show's archived broadcasts.
#[derive(Debug, Parser)]
#[command(name = "aircheck", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Show key to download archives for.
    #[arg(long, default_value = "ded")]
    pub show: String,

    /// Directory downloaded files are saved into.
    #[arg(long, default_value = "./archives")]
    pub out: PathBuf,

    /// Pause between downloads, to avoid hammering the server.
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub delay: Duration,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}
