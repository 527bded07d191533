//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LocalSense seller - brightness telemetry over HTTP and peer connections
#[derive(Parser, Debug)]
#[command(
    name = "localsense-seller",
    author,
    version,
    about = "LocalSense brightness seller node",
    long_about = "Samples a LocalSense brightness sensor on a fixed interval and fans every\n\
                  sample out to HTTP NDJSON stream clients and to validated peers.\n\n\
                  Configuration comes from environment variables (a .env file is loaded\n\
                  first) or from a TOML/JSON file passed with --config."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOCALSENSE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LOCALSENSE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the seller node (HTTP surface + optional peer broadcaster)
    Run(RunArgs),

    /// Load and validate configuration without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON); environment variables are used when omitted
    #[arg(short, long, env = "LOCALSENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the HTTP port
    #[arg(long)]
    pub port: Option<u16>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "LOCALSENSE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Enable the peer broadcaster regardless of configuration
    #[arg(long)]
    pub broadcast: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate; environment variables are used when omitted
    #[arg(short, long, env = "LOCALSENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
