//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ezshare_sync::DEFAULT_MAX_RETRIES;
use ezshare_sync::device::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Mirror the files of an EZ-Share WiFi SD card to a local directory.
///
/// Files are only downloaded when missing locally or when their size or
/// modification time differs from the card's listing.
#[derive(Parser, Debug)]
#[command(name = "ezshare-sync")]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the card
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// SOCKS5 proxy to reach the card through (e.g. localhost:1080)
    #[arg(long, value_name = "HOST:PORT")]
    pub proxy: Option<String>,

    /// Local directory to mirror the card into
    #[arg(long, value_name = "DIR", required_unless_present = "device_info")]
    pub target: Option<PathBuf>,

    /// Show what would be synced without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum retry attempts for timeouts and server errors (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: u32,

    /// Per-request timeout in seconds, body transfer included (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the card's firmware version and exit
    #[arg(long)]
    pub device_info: bool,
}
