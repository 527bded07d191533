//! `run` command implementation.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::commands::load_config;
use crate::node::SellerNode;

/// Execute the `run` command
pub async fn run_node(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        info!(port = port, "Overriding HTTP port from CLI");
        config.http.port = port;
    }
    if args.broadcast && !config.broadcast.enabled {
        info!("Enabling peer broadcaster from CLI");
        config.broadcast.enabled = true;
    }
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;

    info!(
        seller_id = %config.seller.seller_id,
        label = %config.seller.label,
        pi_base = %config.sensor.base_url,
        http = %config.http.bind_addr(),
        broadcast = config.broadcast.enabled,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::install_prometheus(args.metrics_port)?;
    }

    let node = SellerNode::bind(config).await?;
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping node...");
        signal_cancel.cancel();
    });

    info!("Starting seller node...");
    let report = node.run(cancel).await.context("Seller node failed")?;
    report.print_summary();

    info!("LocalSense seller finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
