//! Error notifier - best-effort notice to a peer after a failed write

use std::sync::Arc;

use tracing::{debug, warn};

use contracts::{ContractError, ErrorNotice, PeerTransport, SinkId};
use observability::metrics as obs;

/// Sends `write_error` notices on a peer's control channel
///
/// Failures of the notice itself are logged and swallowed.
pub struct ErrorNotifier<T> {
    transport: Arc<T>,
    seller_id: String,
}

impl<T: PeerTransport + Send + Sync> ErrorNotifier<T> {
    pub fn new(transport: Arc<T>, seller_id: impl Into<String>) -> Self {
        Self {
            transport,
            seller_id: seller_id.into(),
        }
    }

    /// Human-readable notice text
    pub fn message(&self, cause: &ContractError) -> String {
        format!("localsense node {} unavailable: {}", self.seller_id, cause)
    }

    pub async fn notify(&self, peer: &SinkId, cause: &ContractError) {
        let notice = ErrorNotice::write_error(self.message(cause));

        match self.transport.send_error_notice(peer.as_str(), &notice).await {
            Ok(()) => {
                obs::record_error_notice(true);
                debug!(peer = %peer, "Error notice sent");
            }
            Err(e) => {
                obs::record_error_notice(false);
                warn!(peer = %peer, error = %e, "Error notice failed");
            }
        }
    }
}
