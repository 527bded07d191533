//! # Envelope
//!
//! Envelope construction and line encoding.
//!
//! 负责：
//! - 时间戳归一化 (missing / non-positive → wall clock)
//! - 合并 `SellerIdentity` 与 `RawReading` 为 `BroadcastEnvelope`
//! - 编码为 NDJSON 行 (peer / stream 两种形状)
//!
//! ## 使用示例
//!
//! ```ignore
//! use envelope::{EnvelopeBuilder, WireFormat};
//!
//! let builder = EnvelopeBuilder::new(identity, "brightness_sample");
//! let envelope = builder.build(&reading, chrono::Utc::now());
//! let line = WireFormat::Peer.encode(&envelope, now)?;
//! ```

mod builder;
mod codec;

pub use builder::{build_envelope, format_iso, normalize_timestamp, EnvelopeBuilder};
pub use codec::WireFormat;

// Re-export contracts types
pub use contracts::{BroadcastEnvelope, RawReading, SellerIdentity, StreamRecord};
