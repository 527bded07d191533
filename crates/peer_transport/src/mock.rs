//! Mock peer transport
//!
//! Scripted peer table for tests, with failure injection for writes and
//! error notices.

use std::collections::BTreeMap;
use std::sync::Mutex;

use bytes::Bytes;
use contracts::{ContractError, ErrorNotice, PeerSnapshot, PeerTransport};

/// Mock transport configuration
#[derive(Debug, Default, Clone)]
pub struct MockTransportConfig {
    /// Peers whose data writes fail
    pub fail_writes: Vec<String>,
    /// Peers whose error notices fail
    pub fail_notices: Vec<String>,
}

/// Mock peer transport
#[derive(Default)]
pub struct MockPeerTransport {
    config: MockTransportConfig,
    peers: Mutex<BTreeMap<String, PeerSnapshot>>,
    writes: Mutex<Vec<(String, Bytes)>>,
    notices: Mutex<Vec<(String, ErrorNotice)>>,
}

impl MockPeerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockTransportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Add or replace a peer
    pub fn add_peer(&self, peer_id: &str, connected: bool, account_valid: bool) {
        self.peers.lock().unwrap().insert(
            peer_id.to_string(),
            PeerSnapshot {
                peer_id: peer_id.to_string(),
                connected,
                account_valid,
                control_topic: Some(format!("{peer_id}/control")),
            },
        );
    }

    pub fn remove_peer(&self, peer_id: &str) {
        self.peers.lock().unwrap().remove(peer_id);
    }

    /// All successful data writes in order
    pub fn writes(&self) -> Vec<(String, Bytes)> {
        self.writes.lock().unwrap().clone()
    }

    /// Lines written to one peer
    pub fn writes_to(&self, peer_id: &str) -> Vec<Bytes> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == peer_id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// All notices submitted (including failed ones)
    pub fn notices(&self) -> Vec<(String, ErrorNotice)> {
        self.notices.lock().unwrap().clone()
    }
}

impl PeerTransport for MockPeerTransport {
    fn peers(&self) -> Vec<PeerSnapshot> {
        self.peers.lock().unwrap().values().cloned().collect()
    }

    async fn write_and_flush(&self, peer: &str, line: &[u8]) -> Result<(), ContractError> {
        if !self.peers.lock().unwrap().contains_key(peer) {
            return Err(ContractError::sink_gone(peer));
        }
        if self.config.fail_writes.iter().any(|p| p == peer) {
            return Err(ContractError::sink_write(peer, "mock failure"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((peer.to_string(), Bytes::copy_from_slice(line)));
        Ok(())
    }

    async fn send_error_notice(
        &self,
        peer: &str,
        notice: &ErrorNotice,
    ) -> Result<(), ContractError> {
        self.notices
            .lock()
            .unwrap()
            .push((peer.to_string(), notice.clone()));
        if self.config.fail_notices.iter().any(|p| p == peer) {
            return Err(ContractError::sink_write(peer, "mock notice failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let transport = MockPeerTransport::with_config(MockTransportConfig {
            fail_writes: vec!["bad".to_string()],
            ..Default::default()
        });
        transport.add_peer("good", true, true);
        transport.add_peer("bad", true, true);

        transport.write_and_flush("good", b"a\n").await.unwrap();
        assert!(transport.write_and_flush("bad", b"a\n").await.is_err());
        assert!(matches!(
            transport.write_and_flush("gone", b"a\n").await,
            Err(ContractError::SinkGone { .. })
        ));
        assert_eq!(transport.writes_to("good").len(), 1);
        assert!(transport.writes_to("bad").is_empty());
    }
}
