//! Multi-sink registry over the peer transport

use std::sync::Arc;

use bytes::Bytes;

use contracts::{
    ContractError, FailurePolicy, PeerTransport, SinkDescriptor, SinkId, SinkRegistry, SinkState,
};

use crate::notifier::ErrorNotifier;

/// Live view of the transport's peer table
///
/// Eligibility is derived from the transport facts on every snapshot; the
/// registry itself holds no per-peer state.
pub struct PeerRegistry<T> {
    transport: Arc<T>,
    notifier: ErrorNotifier<T>,
}

impl<T: PeerTransport + Send + Sync> PeerRegistry<T> {
    pub fn new(transport: Arc<T>, seller_id: impl Into<String>) -> Self {
        let notifier = ErrorNotifier::new(Arc::clone(&transport), seller_id);
        Self {
            transport,
            notifier,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T: PeerTransport + Send + Sync> SinkRegistry for PeerRegistry<T> {
    fn name(&self) -> &str {
        "peers"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Continue
    }

    fn snapshot(&self) -> Vec<SinkDescriptor> {
        self.transport
            .peers()
            .into_iter()
            .map(|peer| {
                let state = SinkState::from_link(peer.connected, peer.account_valid);
                SinkDescriptor::new(peer.peer_id, state)
            })
            .collect()
    }

    async fn write(&self, sink: &SinkId, line: &Bytes) -> Result<(), ContractError> {
        self.transport.write_and_flush(sink.as_str(), line).await
    }

    async fn on_write_failure(&self, sink: &SinkId, error: &ContractError) {
        self.notifier.notify(sink, error).await;
    }
}
