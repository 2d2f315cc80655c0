//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use dstar_attack::StarvationConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dstar")]
#[command(version, about = "DHCP lease exhaustion tool", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces,

    /// Acquire leases under spoofed client identities until stopped
    Starve(StarveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StarveArgs {
    /// Network interface name
    #[arg(short, long)]
    pub interface: String,

    /// Delay between DISCOVERs in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub interval_ms: u64,

    /// Seconds to wait for a reply before abandoning an exchange
    #[arg(long, value_name = "SECONDS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Stop after acquiring this many leases
    #[arg(long, value_name = "COUNT")]
    pub max_leases: Option<usize>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration_secs: Option<u64>,
}

impl StarveArgs {
    pub fn to_config(&self) -> StarvationConfig {
        let mut config = StarvationConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_attempt_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(max) = self.max_leases {
            config = config.with_max_leases(max);
        }
        if let Some(secs) = self.duration_secs {
            config = config.with_duration(Duration::from_secs(secs));
        }
        config
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter directive implied by `-v`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
