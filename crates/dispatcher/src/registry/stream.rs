//! Single-sink registry backed by an HTTP response body channel

use std::convert::Infallible;

use bytes::Bytes;
use tokio::sync::mpsc;

use contracts::{ContractError, FailurePolicy, SinkDescriptor, SinkId, SinkRegistry, SinkState};

/// Identity of the only sink in a stream registry
pub const STREAM_SINK_ID: &str = "http-stream";

/// Sender half feeding a streaming response body
pub type StreamSender = mpsc::Sender<Result<Bytes, Infallible>>;

/// Exactly one sink: the open response of one `/stream` client
///
/// The sink is `ConnectedValid` while the receiving body is alive. Any write
/// failure is fatal for the owning broadcaster.
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    id: SinkId,
    tx: StreamSender,
}

impl StreamRegistry {
    pub fn new(tx: StreamSender) -> Self {
        Self {
            id: SinkId::from(STREAM_SINK_ID),
            tx,
        }
    }

    /// Name the sink after the client (e.g. its remote address)
    pub fn with_id(mut self, id: impl Into<SinkId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl SinkRegistry for StreamRegistry {
    fn name(&self) -> &str {
        "stream"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Stop
    }

    fn snapshot(&self) -> Vec<SinkDescriptor> {
        let state = if self.is_open() {
            SinkState::ConnectedValid
        } else {
            SinkState::Disconnected
        };
        vec![SinkDescriptor::new(self.id.clone(), state)]
    }

    async fn write(&self, sink: &SinkId, line: &Bytes) -> Result<(), ContractError> {
        if *sink != self.id {
            return Err(ContractError::sink_gone(sink.as_str()));
        }
        // The body forwards every chunk as soon as it is received
        self.tx
            .send(Ok(line.clone()))
            .await
            .map_err(|_| ContractError::sink_gone(sink.as_str()))
    }

    async fn on_write_failure(&self, _sink: &SinkId, _error: &ContractError) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_reaches_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let registry = StreamRegistry::new(tx);

        let id = SinkId::from(STREAM_SINK_ID);
        registry
            .write(&id, &Bytes::from_static(b"{\"ts\":1}\n"))
            .await
            .unwrap();

        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"{\"ts\":1}\n");
    }

    #[tokio::test]
    async fn test_dropped_receiver_disconnects_sink() {
        let (tx, rx) = mpsc::channel(4);
        let registry = StreamRegistry::new(tx).with_id("127.0.0.1:5000");
        assert_eq!(registry.snapshot()[0].state, SinkState::ConnectedValid);

        drop(rx);
        assert_eq!(registry.snapshot()[0].state, SinkState::Disconnected);

        let err = registry
            .write(&SinkId::from("127.0.0.1:5000"), &Bytes::from_static(b"x\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::SinkGone { .. }));
    }

    #[test]
    fn test_stream_policy_is_stop() {
        let (tx, _rx) = mpsc::channel(1);
        assert_eq!(StreamRegistry::new(tx).failure_policy(), FailurePolicy::Stop);
    }
}
