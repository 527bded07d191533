//! Dispatcher error types

use thiserror::Error;

use contracts::ContractError;

/// Reasons a broadcaster terminated on its own
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A write failed under the `Stop` policy (e.g. the stream client went away)
    #[error("broadcaster '{broadcaster}' stopped: sink '{sink}' failed: {source}")]
    SinkFailed {
        broadcaster: String,
        sink: String,
        #[source]
        source: ContractError,
    },

    /// The envelope could not be encoded under the `Stop` policy
    #[error("broadcaster '{broadcaster}' stopped: encoder failed: {source}")]
    EncoderFailed {
        broadcaster: String,
        #[source]
        source: ContractError,
    },
}

impl DispatcherError {
    pub fn sink_failed(
        broadcaster: impl Into<String>,
        sink: impl Into<String>,
        source: ContractError,
    ) -> Self {
        Self::SinkFailed {
            broadcaster: broadcaster.into(),
            sink: sink.into(),
            source,
        }
    }

    pub fn encoder_failed(broadcaster: impl Into<String>, source: ContractError) -> Self {
        Self::EncoderFailed {
            broadcaster: broadcaster.into(),
            source,
        }
    }

    /// Client disconnects are an ordinary way for a stream to end
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::SinkFailed {
                source: ContractError::SinkGone { .. },
                ..
            }
        )
    }
}
