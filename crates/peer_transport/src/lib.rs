//! # Peer Transport
//!
//! TCP line transport for peer subscribers.
//!
//! Responsibilities:
//! - Accept peer connections and run the JSON-line handshake
//! - Validate peer accounts against the configured policy
//! - Keep the peer table (`PeerTable`) that broadcasters snapshot every tick
//! - Deliver data lines and error notices with buffered write + flush
//! - Provide a scripted `MockPeerTransport` for tests

pub mod error;
pub mod listener;
pub mod mock;
pub mod policy;
pub mod protocol;
pub mod table;

pub use contracts::{ErrorNotice, NoticeKind, PeerSnapshot, PeerTransport};
pub use error::{Result, TransportError};
pub use listener::TcpPeerListener;
pub use mock::{MockPeerTransport, MockTransportConfig};
pub use policy::AccountPolicy;
pub use protocol::{ControlMessage, ErrorFrame, Handshake, HelloFrame};
pub use table::{ConnectionId, PeerLink, PeerTable, DEFAULT_WRITE_TIMEOUT};
