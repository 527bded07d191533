//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::NodeConfig;

use crate::cli::ValidateArgs;
use crate::commands::load_config;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    seller_id: String,
    label: String,
    pi_base: String,
    http_bind: String,
    stream_interval_secs: u64,
    broadcast_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    broadcast: Option<BroadcastSummary>,
}

#[derive(Serialize)]
struct BroadcastSummary {
    protocol_id: String,
    version: String,
    interval_secs: u64,
    peer_bind: String,
    allowed_accounts: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);
    info!(source = %result.source, valid = result.valid, "Validated configuration");

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => "environment".to_string(),
    };

    match load_config(args.config.as_deref()) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                source,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(config: &NodeConfig) -> ConfigSummary {
    let broadcast = config.broadcast.enabled.then(|| BroadcastSummary {
        protocol_id: config.broadcast.protocol_id.clone(),
        version: config.broadcast.version.clone(),
        interval_secs: config.broadcast.interval().as_secs(),
        peer_bind: config.peers.bind.clone(),
        allowed_accounts: config.peers.allowed_accounts.len(),
    });

    ConfigSummary {
        seller_id: config.seller.seller_id.clone(),
        label: config.seller.label.clone(),
        pi_base: config.sensor.base_url.clone(),
        http_bind: config.http.bind_addr(),
        stream_interval_secs: config.http.stream_interval().as_secs(),
        broadcast_enabled: config.broadcast.enabled,
        broadcast,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &NodeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.broadcast.enabled && config.peers.allowed_accounts.is_empty() {
        warnings.push(
            "peers.allowed_accounts is empty - any peer with an account id will receive samples"
                .to_string(),
        );
    }

    if config.http.stream_interval_seconds <= 0 {
        warnings.push(format!(
            "http.stream_interval_seconds is {} - using {}s",
            config.http.stream_interval_seconds,
            config.http.stream_interval().as_secs()
        ));
    }

    if config.sensor.base_url.starts_with("http://") && !is_local(&config.sensor.base_url) {
        warnings.push("sensor.base_url uses plain HTTP to a non-local host".to_string());
    }

    warnings
}

fn is_local(url: &str) -> bool {
    let host = url
        .trim_start_matches("http://")
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host == "localhost"
        || host.starts_with("127.")
        || host.starts_with("192.168.")
        || host.starts_with("10.")
        || host.ends_with(".local")
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Seller: {} ({})", summary.seller_id, summary.label);
            println!("  Sensor: {}", summary.pi_base);
            println!("  HTTP: {}", summary.http_bind);
            println!("  Stream interval: {}s", summary.stream_interval_secs);
            match summary.broadcast {
                Some(ref broadcast) => {
                    println!(
                        "  Broadcast: {} {} every {}s",
                        broadcast.protocol_id, broadcast.version, broadcast.interval_secs
                    );
                    println!(
                        "  Peers: {} ({} allowed accounts)",
                        broadcast.peer_bind, broadcast.allowed_accounts
                    );
                }
                None => println!("  Broadcast: disabled"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
