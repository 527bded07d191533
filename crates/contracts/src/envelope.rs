//! BroadcastEnvelope - Envelope Builder output
//!
//! The canonical record sent to every sink in one tick, plus the narrower
//! projection used by the HTTP NDJSON stream.

use serde::{Deserialize, Serialize};

/// Canonical per-tick broadcast record
///
/// Built fresh every tick and never mutated afterwards. Field order is the
/// serialization order, so identical envelopes encode to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    /// Normalized epoch seconds (always > 0)
    pub ts: i64,

    /// RFC 3339 UTC rendering of `ts`
    pub ts_iso: String,

    /// Brightness value from the reading
    pub brightness: f64,

    /// Seller identifier
    pub seller_id: String,

    /// Origin of the sample (the seller identifier)
    pub source: String,

    /// Location label
    pub label: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Sample-kind tag
    pub kind: String,
}

/// NDJSON stream line served on `GET /stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub ts: i64,
    pub brightness: f64,
    pub seller_id: String,
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    /// Wall-clock time of the tick that produced this line
    pub time_iso: String,
}

impl StreamRecord {
    /// Project an envelope onto the stream shape
    pub fn from_envelope(envelope: &BroadcastEnvelope, time_iso: impl Into<String>) -> Self {
        Self {
            ts: envelope.ts,
            brightness: envelope.brightness,
            seller_id: envelope.seller_id.clone(),
            lat: envelope.lat,
            lon: envelope.lon,
            label: envelope.label.clone(),
            time_iso: time_iso.into(),
        }
    }
}
