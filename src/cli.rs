// Command-line flags. Every flag is optional and overrides the matching config file value.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Default, Parser)]
#[command(
    name = "dockerstats",
    about = "Simple Docker Stats Prometheus Exporter",
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to $CONFIG_FILE, then ./config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to expose metrics
    #[arg(long)]
    pub port: Option<u16>,

    /// Interval in seconds (min: 3)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Max concurrent API calls
    #[arg(long)]
    pub workers: Option<usize>,

    /// Docker host IP (for TCP connection)
    #[arg(long = "hostip")]
    pub host_ip: Option<String>,

    /// Docker host port (for TCP connection)
    #[arg(long = "hostport")]
    pub host_port: Option<u16>,

    /// Show version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,
}
