//! Layered error definitions
//!
//! Categorized by source: config / upstream sensor / envelope / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Upstream Sensor Errors =====
    /// Upstream unreachable or non-success status
    #[error("fetch {url} failed: {message}")]
    Fetch { url: String, message: String },

    /// Upstream body does not have the expected shape
    #[error("decode {url} failed: {message}")]
    Decode { url: String, message: String },

    // ===== Envelope Errors =====
    /// Envelope cannot be encoded
    #[error("envelope serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink disappeared between snapshot and write
    #[error("sink '{sink_name}' is gone")]
    SinkGone { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create upstream fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create upstream decode error
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink gone error
    pub fn sink_gone(sink_name: impl Into<String>) -> Self {
        Self::SinkGone {
            sink_name: sink_name.into(),
        }
    }

    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } => "config",
            Self::Fetch { .. } => "fetch",
            Self::Decode { .. } => "decode",
            Self::Serialization(_) => "serialization",
            Self::SinkWrite { .. } | Self::SinkGone { .. } => "sink_write",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
