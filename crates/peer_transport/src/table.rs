//! Peer table - arena of live peer connections keyed by peer id
//!
//! Only the transport mutates entries (connect, validate, disconnect, remove).
//! Broadcasters read a fresh snapshot per tick and never hold entry handles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use contracts::{ContractError, ErrorNotice, PeerId, PeerSnapshot, PeerTransport};

use crate::protocol::{encode_frame, ErrorFrame};

type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;
type SharedWriter = Arc<Mutex<BufWriter<PeerWriter>>>;

/// Identifies one physical connection of a peer id
///
/// A peer that reconnects gets a new id, so the old connection's cleanup
/// cannot remove the new entry.
pub type ConnectionId = u64;

/// Link state tracked by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerLink {
    Connected,
    Disconnected,
}

struct PeerEntry {
    connection: ConnectionId,
    link: PeerLink,
    account_id: String,
    account_valid: bool,
    control_topic: Option<String>,
    writer: SharedWriter,
}

/// Write deadline used by [`PeerTable::new`]
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Peer connection table
pub struct PeerTable {
    entries: RwLock<BTreeMap<PeerId, PeerEntry>>,
    next_connection: AtomicU64,
    write_timeout: Duration,
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::with_write_timeout(DEFAULT_WRITE_TIMEOUT)
    }
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose writes (lock, write, flush) must finish within `write_timeout`
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_connection: AtomicU64::new(0),
            write_timeout,
        }
    }

    /// Register a freshly handshaken connection as connected but unverified
    ///
    /// Replaces any previous entry for the same peer id.
    pub fn insert<W>(
        &self,
        peer_id: impl Into<PeerId>,
        account_id: impl Into<String>,
        control_topic: Option<String>,
        writer: W,
    ) -> ConnectionId
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let connection = self.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
        let writer: PeerWriter = Box::new(writer);
        let entry = PeerEntry {
            connection,
            link: PeerLink::Connected,
            account_id: account_id.into(),
            account_valid: false,
            control_topic,
            writer: Arc::new(Mutex::new(BufWriter::new(writer))),
        };

        let peer_id = peer_id.into();
        let replaced = self.write_entries().insert(peer_id.clone(), entry).is_some();
        debug!(peer = %peer_id, connection, replaced, "Peer registered");
        connection
    }

    /// Record the account validation result for a connection
    pub fn set_account_valid(&self, peer_id: &str, connection: ConnectionId, valid: bool) {
        if let Some(entry) = self.write_entries().get_mut(peer_id) {
            if entry.connection == connection {
                entry.account_valid = valid;
            }
        }
    }

    /// Keep the entry but stop delivering to it
    pub fn mark_disconnected(&self, peer_id: &str) {
        if let Some(entry) = self.write_entries().get_mut(peer_id) {
            entry.link = PeerLink::Disconnected;
        }
    }

    /// Drop the entry owned by `connection`
    pub fn remove(&self, peer_id: &str, connection: ConnectionId) -> bool {
        let mut entries = self.write_entries();
        let owned = entries
            .get(peer_id)
            .is_some_and(|entry| entry.connection == connection);
        if owned {
            entries.remove(peer_id);
        }
        owned
    }

    pub fn account_id(&self, peer_id: &str) -> Option<String> {
        self.read_entries()
            .get(peer_id)
            .map(|entry| entry.account_id.clone())
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffered write of one line followed by a flush
    ///
    /// A failed or timed-out write marks the peer disconnected.
    #[instrument(name = "peer_table_write_line", skip(self, line), fields(peer = %peer_id, len = line.len()))]
    pub async fn write_line(&self, peer_id: &str, line: &[u8]) -> Result<(), ContractError> {
        let writer = {
            let entries = self.read_entries();
            match entries.get(peer_id) {
                Some(entry) if entry.link == PeerLink::Connected => Arc::clone(&entry.writer),
                _ => return Err(ContractError::sink_gone(peer_id)),
            }
        };
        self.write_bounded(peer_id, &writer, line).await
    }

    async fn write_bounded(
        &self,
        peer_id: &str,
        writer: &SharedWriter,
        line: &[u8],
    ) -> Result<(), ContractError> {
        let write = async {
            let mut writer = writer.lock().await;
            writer.write_all(line).await?;
            writer.flush().await
        };

        let error = match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("write timed out after {:?}", self.write_timeout),
        };

        self.mark_disconnected(peer_id);
        Err(ContractError::sink_write(peer_id, error))
    }

    /// Shut down every writer (used on process shutdown)
    pub async fn close_all(&self) {
        let writers: Vec<SharedWriter> = self
            .read_entries()
            .values()
            .map(|entry| Arc::clone(&entry.writer))
            .collect();

        for writer in writers {
            let _ = writer.lock().await.shutdown().await;
        }
    }

    // Entries stay consistent across a panicking holder: every mutation is a
    // single field or map operation.
    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<PeerId, PeerEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<PeerId, PeerEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PeerTransport for PeerTable {
    fn peers(&self) -> Vec<PeerSnapshot> {
        self.read_entries()
            .iter()
            .map(|(peer_id, entry)| PeerSnapshot {
                peer_id: peer_id.clone(),
                connected: entry.link == PeerLink::Connected,
                account_valid: entry.account_valid,
                control_topic: entry.control_topic.clone(),
            })
            .collect()
    }

    async fn write_and_flush(&self, peer: &str, line: &[u8]) -> Result<(), ContractError> {
        self.write_line(peer, line).await
    }

    async fn send_error_notice(
        &self,
        peer: &str,
        notice: &ErrorNotice,
    ) -> Result<(), ContractError> {
        // Notices follow a failed data write, so a disconnected entry
        // still gets one bounded attempt.
        let (writer, topic) = {
            let entries = self.read_entries();
            match entries.get(peer) {
                Some(entry) => (Arc::clone(&entry.writer), entry.control_topic.clone()),
                None => return Err(ContractError::sink_gone(peer)),
            }
        };

        let line = encode_frame(&ErrorFrame::from(notice).with_topic(topic))?;
        self.write_bounded(peer, &writer, &line).await
    }
}
