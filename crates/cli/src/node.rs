//! Seller node orchestration
//!
//! Wires the upstream sensor, the HTTP surface and (optionally) the peer
//! listener plus its broadcaster under one cancellation token.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use contracts::NodeConfig;
use dispatcher::{BroadcastStats, Broadcaster, DispatcherError, PeerRegistry};
use envelope::{EnvelopeBuilder, WireFormat};
use ingestion::HttpSensorSource;
use peer_transport::{PeerTable, TcpPeerListener};

use crate::server::{self, AppState};

/// Final statistics of a node run
#[derive(Debug, Default)]
pub struct NodeReport {
    /// Peer broadcaster counters (None when broadcasting was disabled)
    pub peers: Option<BroadcastStats>,
}

impl NodeReport {
    pub fn print_summary(&self) {
        println!("\n=== Seller Node Statistics ===\n");
        match &self.peers {
            Some(stats) => {
                println!("Peer broadcaster:");
                print!("{stats}");
            }
            None => println!("Peer broadcaster: disabled"),
        }
        println!();
    }
}

/// Bound but not yet running node
pub struct SellerNode {
    config: Arc<NodeConfig>,
    source: Arc<HttpSensorSource>,
    builder: EnvelopeBuilder,
    http: TcpListener,
    peers: Option<TcpPeerListener>,
}

type PeerTasks = (
    JoinHandle<peer_transport::Result<()>>,
    JoinHandle<Result<BroadcastStats, DispatcherError>>,
);

impl SellerNode {
    /// Build the sensor client and bind every listener
    pub async fn bind(config: NodeConfig) -> Result<Self> {
        let config = Arc::new(config);
        let source = Arc::new(
            HttpSensorSource::new(&config.sensor).context("Failed to build sensor client")?,
        );
        let builder = EnvelopeBuilder::new(
            Arc::new(config.seller.clone()),
            config.broadcast.sample_kind.clone(),
        );

        let bind_addr = config.http.bind_addr();
        let http = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind HTTP surface on {bind_addr}"))?;

        let peers = if config.broadcast.enabled {
            let listener = TcpPeerListener::bind(
                &config.peers,
                &config.broadcast,
                &config.seller.seller_id,
                Arc::new(PeerTable::with_write_timeout(config.peers.write_timeout())),
            )
            .await
            .context("Failed to bind peer listener")?;
            Some(listener)
        } else {
            None
        };

        Ok(Self {
            config,
            source,
            builder,
            http,
            peers,
        })
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        Ok(self.http.local_addr()?)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peers.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Run until `cancel` fires or the HTTP surface fails
    pub async fn run(self, cancel: CancellationToken) -> Result<NodeReport> {
        let peer_tasks = self.peers.map(|listener| {
            let table = listener.table();
            let registry = PeerRegistry::new(table, self.config.seller.seller_id.clone());
            let broadcaster = Broadcaster::new(
                "peers",
                Arc::clone(&self.source),
                registry,
                self.builder.clone(),
                WireFormat::Peer,
                self.config.broadcast.interval(),
            );
            info!(
                protocol = %self.config.broadcast.protocol_id,
                interval_secs = broadcaster.interval().as_secs(),
                "Peer broadcaster starting"
            );

            let listener_task = tokio::spawn(listener.run(cancel.child_token()));
            let broadcaster_task = tokio::spawn(broadcaster.run(cancel.child_token()));
            (listener_task, broadcaster_task)
        });

        let state = AppState {
            config: Arc::clone(&self.config),
            source: self.source,
            builder: self.builder,
            shutdown: cancel.child_token(),
        };
        let http_result = server::serve(self.http, state).await;

        // Whatever ended the HTTP surface ends the node
        cancel.cancel();

        let peers = match peer_tasks {
            Some(tasks) => Some(join_peer_tasks(tasks).await),
            None => None,
        };

        http_result.context("HTTP surface failed")?;
        Ok(NodeReport { peers })
    }
}

async fn join_peer_tasks((listener, broadcaster): PeerTasks) -> BroadcastStats {
    match listener.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Peer listener failed"),
        Err(e) => error!(error = %e, "Peer listener task panicked"),
    }

    match broadcaster.await {
        Ok(Ok(stats)) => stats,
        Ok(Err(e)) => {
            warn!(error = %e, "Peer broadcaster stopped");
            BroadcastStats::default()
        }
        Err(e) => {
            error!(error = %e, "Peer broadcaster task panicked");
            BroadcastStats::default()
        }
    }
}
