//! PeerTransport - observable contract of the peer-to-peer layer
//!
//! The transport owns connection bookkeeping (handshake, account validation,
//! disconnects). Broadcasters only read snapshots and use the two delivery
//! primitives below.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Peer identity as assigned by the transport
pub type PeerId = String;

/// Transport-level view of one peer connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    /// Peer identity
    pub peer_id: PeerId,

    /// Link is up
    pub connected: bool,

    /// Peer account passed validation
    pub account_valid: bool,

    /// Control/response channel the peer listens on for notices
    pub control_topic: Option<String>,
}

/// Kind of out-of-band notice sent to a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A data write to this peer failed
    WriteError,
    /// The peer account was not accepted
    ValidationError,
}

/// Out-of-band error notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl ErrorNotice {
    pub fn write_error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::WriteError,
            message: message.into(),
        }
    }
}

/// Peer transport trait
#[trait_variant::make(PeerTransport: Send)]
pub trait LocalPeerTransport {
    /// Fresh snapshot of every known peer
    fn peers(&self) -> Vec<PeerSnapshot>;

    /// Buffered write of one line to a peer followed by a flush
    async fn write_and_flush(&self, peer: &str, line: &[u8]) -> Result<(), ContractError>;

    /// Submit an error notice on the peer's control channel
    async fn send_error_notice(&self, peer: &str, notice: &ErrorNotice)
        -> Result<(), ContractError>;
}
