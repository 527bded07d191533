//! TCP peer listener - handshake, account validation, control lines

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use contracts::{BroadcastConfig, ErrorNotice, NoticeKind, PeerListenerConfig, PeerTransport};

use crate::error::{Result, TransportError};
use crate::policy::AccountPolicy;
use crate::protocol::{encode_frame, ControlMessage, Handshake, HelloFrame};
use crate::table::PeerTable;

/// Everything a connection task needs
struct SessionContext {
    table: Arc<PeerTable>,
    policy: AccountPolicy,
    hello: HelloFrame,
    handshake_timeout: Duration,
}

/// Accepts peer connections and maintains the shared [`PeerTable`]
pub struct TcpPeerListener {
    listener: TcpListener,
    context: Arc<SessionContext>,
}

impl TcpPeerListener {
    /// Bind the listener
    #[instrument(name = "peer_listener_bind", skip_all, fields(bind = %config.bind))]
    pub async fn bind(
        config: &PeerListenerConfig,
        broadcast: &BroadcastConfig,
        seller_id: &str,
        table: Arc<PeerTable>,
    ) -> Result<Self> {
        let listener =
            TcpListener::bind(&config.bind)
                .await
                .map_err(|source| TransportError::Bind {
                    addr: config.bind.clone(),
                    source,
                })?;

        let context = SessionContext {
            table,
            policy: AccountPolicy::allowlist(&config.allowed_accounts),
            hello: HelloFrame {
                seller_id: seller_id.to_string(),
                protocol: broadcast.protocol_id.clone(),
                version: broadcast.version.clone(),
            },
            handshake_timeout: config.handshake_timeout(),
        };

        Ok(Self {
            listener,
            context: Arc::new(context),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn table(&self) -> Arc<PeerTable> {
        Arc::clone(&self.context.table)
    }

    /// Accept connections until cancelled
    ///
    /// Every connection runs in its own task with a child token.
    #[instrument(name = "peer_listener_run", skip_all)]
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, protocol = %self.context.hello.protocol, "Peer listener started");
        }

        loop {
            let accepted = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, remote)) => {
                    let context = Arc::clone(&self.context);
                    let session_cancel = cancel.child_token();
                    tokio::spawn(async move {
                        if let Err(e) = serve_peer(stream, remote, context, session_cancel).await {
                            warn!(remote = %remote, error = %e, "Peer session ended with error");
                        }
                    });
                }
                Err(e) => {
                    // Accept errors (e.g. fd exhaustion) are per-connection
                    warn!(error = %e, "Accept failed");
                }
            }
        }

        self.context.table.close_all().await;
        info!("Peer listener stopped");
        Ok(())
    }
}

/// One peer connection from handshake to EOF
#[instrument(name = "peer_session", skip(stream, context, cancel), fields(remote = %remote))]
async fn serve_peer(
    stream: TcpStream,
    remote: SocketAddr,
    context: Arc<SessionContext>,
    cancel: CancellationToken,
) -> Result<()> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // 1. Handshake line within the timeout
    let first = tokio::time::timeout(context.handshake_timeout, lines.next_line())
        .await
        .map_err(|_| TransportError::HandshakeTimeout {
            remote: remote.to_string(),
        })??
        .ok_or_else(|| TransportError::handshake(remote.to_string(), "closed before handshake"))?;

    let handshake: Handshake = serde_json::from_str(&first)
        .map_err(|e| TransportError::handshake(remote.to_string(), e.to_string()))?;

    if handshake.peer_id.trim().is_empty() {
        return Err(TransportError::handshake(remote.to_string(), "empty peer_id"));
    }
    if handshake.protocol != context.hello.protocol {
        return Err(TransportError::ProtocolMismatch {
            peer_id: handshake.peer_id,
            requested: handshake.protocol,
            expected: context.hello.protocol.clone(),
        });
    }

    // 2. Register unverified, then validate the account
    let peer_id = handshake.peer_id;
    let table = &context.table;
    let connection = table.insert(
        peer_id.clone(),
        handshake.account_id.clone(),
        handshake.control_topic,
        write_half,
    );

    if context.policy.is_valid(&handshake.account_id) {
        let hello = encode_frame(&context.hello)?;
        if let Err(e) = table.write_and_flush(&peer_id, &hello).await {
            table.remove(&peer_id, connection);
            return Err(e.into());
        }
        table.set_account_valid(&peer_id, connection, true);
        info!(peer = %peer_id, account = %handshake.account_id, "Peer connected");
    } else {
        let notice = ErrorNotice {
            kind: NoticeKind::ValidationError,
            message: format!("account '{}' is not accepted", handshake.account_id),
        };
        if let Err(e) = table.send_error_notice(&peer_id, &notice).await {
            debug!(peer = %peer_id, error = %e, "Validation notice failed");
        }
        warn!(peer = %peer_id, account = %handshake.account_id, "Peer account rejected");
    }

    // 3. Control lines until EOF
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match ControlMessage::classify(&line) {
                ControlMessage::Typed(kind) => {
                    info!(peer = %peer_id, message_type = %kind, "Control message")
                }
                ControlMessage::Unclassified => {
                    info!(peer = %peer_id, line = %line, "Unclassified control message")
                }
            },
            Ok(None) => {
                debug!(peer = %peer_id, "Peer closed connection");
                break;
            }
            Err(e) => {
                warn!(peer = %peer_id, error = %e, "Peer read failed");
                break;
            }
        }
    }

    table.remove(&peer_id, connection);
    info!(peer = %peer_id, "Peer removed");
    Ok(())
}
