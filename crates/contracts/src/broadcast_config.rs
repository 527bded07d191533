//! Broadcaster configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback tick interval (seconds)
pub const DEFAULT_INTERVAL_SECONDS: i64 = 5;
/// Fallback protocol / topic identifier
pub const DEFAULT_PROTOCOL_ID: &str = "/localsense/brightness/v1";
/// Fallback protocol version
pub const DEFAULT_VERSION: &str = "0.1.0";
/// Fallback sample-kind tag
pub const DEFAULT_SAMPLE_KIND: &str = "brightness_sample";
/// Longest accepted tick interval (one day)
pub const MAX_INTERVAL_SECONDS: i64 = 86_400;

/// Peer broadcaster configuration
///
/// Immutable per broadcaster instance. Call [`BroadcastConfig::ensure_defaults`]
/// after loading; unset or invalid fields are replaced by the fallbacks above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Whether the peer broadcaster runs at all
    #[serde(default)]
    pub enabled: bool,

    /// Protocol / topic identifier peers must present
    #[serde(default)]
    pub protocol_id: String,

    /// Version string announced to peers
    #[serde(default)]
    pub version: String,

    /// Tick interval in seconds (<= 0 means default)
    #[serde(default)]
    pub interval_seconds: i64,

    /// Sample-kind tag stamped on every envelope
    #[serde(default)]
    pub sample_kind: String,
}

impl BroadcastConfig {
    /// Replace unset or invalid fields with fallbacks
    pub fn ensure_defaults(mut self) -> Self {
        if self.interval_seconds <= 0 {
            self.interval_seconds = DEFAULT_INTERVAL_SECONDS;
        }
        if self.protocol_id.trim().is_empty() {
            self.protocol_id = DEFAULT_PROTOCOL_ID.to_string();
        }
        if self.version.trim().is_empty() {
            self.version = DEFAULT_VERSION.to_string();
        }
        if self.sample_kind.trim().is_empty() {
            self.sample_kind = DEFAULT_SAMPLE_KIND.to_string();
        }
        self
    }

    /// Tick interval as a `Duration`
    pub fn interval(&self) -> Duration {
        interval_from_seconds(self.interval_seconds)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            protocol_id: DEFAULT_PROTOCOL_ID.to_string(),
            version: DEFAULT_VERSION.to_string(),
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            sample_kind: DEFAULT_SAMPLE_KIND.to_string(),
        }
    }
}

/// Convert a possibly invalid seconds value into a usable interval
///
/// Values above [`MAX_INTERVAL_SECONDS`] are clamped to it.
pub fn interval_from_seconds(seconds: i64) -> Duration {
    if seconds <= 0 {
        Duration::from_secs(DEFAULT_INTERVAL_SECONDS as u64)
    } else {
        Duration::from_secs(seconds.min(MAX_INTERVAL_SECONDS) as u64)
    }
}
