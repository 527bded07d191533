//! NodeConfig - Config Loader output
//!
//! Describes the whole seller node: identity, upstream sensor, HTTP surface,
//! peer broadcaster and peer listener.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::{interval_from_seconds, BroadcastConfig, SellerIdentity};

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NodeConfig {
    /// Static identity
    #[validate(nested)]
    pub seller: SellerIdentity,

    /// Upstream sensor service
    pub sensor: SensorEndpointConfig,

    /// HTTP surface
    #[serde(default)]
    pub http: HttpConfig,

    /// Peer broadcaster
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Peer listener (transport side)
    #[serde(default)]
    pub peers: PeerListenerConfig,
}

impl NodeConfig {
    /// Apply fallbacks to every section that has them
    pub fn ensure_defaults(mut self) -> Self {
        self.broadcast = self.broadcast.ensure_defaults();
        self
    }
}

/// Upstream sensor endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEndpointConfig {
    /// Base URL; `/metrics` and `/health` are appended
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_sensor_timeout_ms")]
    pub timeout_ms: u64,
}

impl SensorEndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_sensor_timeout_ms() -> u64 {
    5000
}

/// HTTP surface configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bind host
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Listen port
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Tick interval of each `/stream` connection (seconds, <= 0 means default)
    #[serde(default = "default_stream_interval")]
    pub stream_interval_seconds: i64,
}

impl HttpConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn stream_interval(&self) -> Duration {
        interval_from_seconds(self.stream_interval_seconds)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_http_port(),
            stream_interval_seconds: default_stream_interval(),
        }
    }
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    9000
}

fn default_stream_interval() -> i64 {
    crate::DEFAULT_INTERVAL_SECONDS
}

/// Peer listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerListenerConfig {
    /// TCP bind address
    #[serde(default = "default_peer_bind")]
    pub bind: String,

    /// Accounts allowed to receive samples (empty = any non-empty account)
    #[serde(default)]
    pub allowed_accounts: Vec<String>,

    /// Time peer has to send its handshake (milliseconds)
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Deadline for one buffered write plus flush to a peer (milliseconds)
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl PeerListenerConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for PeerListenerConfig {
    fn default() -> Self {
        Self {
            bind: default_peer_bind(),
            allowed_accounts: Vec::new(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

fn default_peer_bind() -> String {
    "0.0.0.0:4100".to_string()
}

fn default_handshake_timeout_ms() -> u64 {
    5000
}

fn default_write_timeout_ms() -> u64 {
    2000
}
