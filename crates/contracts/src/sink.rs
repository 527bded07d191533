//! Sink contracts - destinations of the broadcast loop
//!
//! A `SinkRegistry` is the live view of destinations for one broadcaster
//! instance. The broadcaster reads it once per tick and never keeps a
//! reference to a sink across ticks.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Opaque sink identity (peer id, or the single HTTP stream)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkId(String);

impl SinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SinkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SinkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Liveness state of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkState {
    Disconnected,
    ConnectedUnverified,
    ConnectedValid,
}

impl SinkState {
    /// Derive the state from transport-level facts
    pub fn from_link(connected: bool, validated: bool) -> Self {
        match (connected, validated) {
            (false, _) => Self::Disconnected,
            (true, false) => Self::ConnectedUnverified,
            (true, true) => Self::ConnectedValid,
        }
    }

    /// Only `ConnectedValid` sinks receive writes
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::ConnectedValid)
    }
}

/// One registry entry as seen by the broadcaster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    pub id: SinkId,
    pub state: SinkState,
}

impl SinkDescriptor {
    pub fn new(id: impl Into<SinkId>, state: SinkState) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

/// What the broadcaster does after a failed write (or a broken encoder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, notify and move on to the next sink
    Continue,
    /// Terminate the broadcaster
    Stop,
}

/// Keep only the sinks that may receive writes this tick
pub fn eligible(descriptors: Vec<SinkDescriptor>) -> Vec<SinkDescriptor> {
    descriptors
        .into_iter()
        .filter(|d| d.state.is_eligible())
        .collect()
}

/// Sink registry trait
///
/// The capability set a broadcaster instance is parameterized by:
/// iterate sinks, write one, and react to a failed write.
#[trait_variant::make(SinkRegistry: Send)]
pub trait LocalSinkRegistry {
    /// Registry name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Failure policy of this instantiation
    fn failure_policy(&self) -> FailurePolicy;

    /// Fresh snapshot of all known sinks
    fn snapshot(&self) -> Vec<SinkDescriptor>;

    /// Write one newline-terminated line to one sink and flush it
    ///
    /// # Errors
    /// `SinkWrite` on delivery failure, `SinkGone` when the sink vanished
    /// after the snapshot was taken.
    async fn write(&self, sink: &SinkId, line: &Bytes) -> Result<(), ContractError>;

    /// Called after a failed write (only under `FailurePolicy::Continue`)
    async fn on_write_failure(&self, sink: &SinkId, error: &ContractError);
}
