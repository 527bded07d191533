//! Peer transport error types

use contracts::ContractError;
use thiserror::Error;

/// Peer transport specific error
#[derive(Debug, Error)]
pub enum TransportError {
    /// Listener bind error
    #[error("failed to bind peer listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Handshake line missing or malformed
    #[error("handshake from {remote} rejected: {message}")]
    Handshake { remote: String, message: String },

    /// Peer asked for another protocol
    #[error("peer {peer_id} requested protocol '{requested}', expected '{expected}'")]
    ProtocolMismatch {
        peer_id: String,
        requested: String,
        expected: String,
    },

    /// No handshake within the configured timeout
    #[error("handshake from {remote} timed out")]
    HandshakeTimeout { remote: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl TransportError {
    /// Create handshake error
    pub fn handshake(remote: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handshake {
            remote: remote.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, TransportError>;
