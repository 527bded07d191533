//! # LocalSense Seller CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证 (环境变量 / 配置文件)
//! - HTTP 接口与 peer 广播编排
//! - 优雅关闭处理

mod cli;
mod commands;
mod node;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_node, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "LocalSense seller starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// `RUST_LOG` wins over the verbosity flags.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_tracing(&observability::TracingConfig {
        log_format: cli.log_format.into(),
        default_directive: default_log_level.to_string(),
    })
}
