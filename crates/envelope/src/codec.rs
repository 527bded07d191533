//! Line codec - one JSON object per line

use bytes::Bytes;
use chrono::{DateTime, Utc};
use contracts::{BroadcastEnvelope, ContractError, StreamRecord};
use serde::Serialize;

use crate::builder::format_iso;

/// On-the-wire shape of one broadcast line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Full envelope, written to peers
    Peer,
    /// Stream projection with the tick's wall-clock time
    Stream,
}

impl WireFormat {
    /// Encode one envelope as a newline-terminated JSON line
    ///
    /// `now` is only used by [`WireFormat::Stream`] for `time_iso`.
    pub fn encode(
        self,
        envelope: &BroadcastEnvelope,
        now: DateTime<Utc>,
    ) -> Result<Bytes, ContractError> {
        match self {
            Self::Peer => encode_line(envelope),
            Self::Stream => encode_line(&StreamRecord::from_envelope(envelope, format_iso(now))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peer => "peer",
            Self::Stream => "stream",
        }
    }
}

fn encode_line<T: Serialize>(value: &T) -> Result<Bytes, ContractError> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope() -> BroadcastEnvelope {
        BroadcastEnvelope {
            ts: 1_700_000_000,
            ts_iso: "2023-11-14T22:13:20Z".to_string(),
            brightness: 0.42,
            seller_id: "pi-1".to_string(),
            source: "pi-1".to_string(),
            label: "porch".to_string(),
            lat: 51.5,
            lon: -0.12,
            kind: "brightness_sample".to_string(),
        }
    }

    fn tick_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap()
    }

    #[test]
    fn test_peer_line_field_order() {
        let line = WireFormat::Peer.encode(&envelope(), tick_time()).unwrap();
        assert_eq!(
            std::str::from_utf8(&line).unwrap(),
            "{\"ts\":1700000000,\"ts_iso\":\"2023-11-14T22:13:20Z\",\"brightness\":0.42,\
             \"seller_id\":\"pi-1\",\"source\":\"pi-1\",\"label\":\"porch\",\"lat\":51.5,\
             \"lon\":-0.12,\"kind\":\"brightness_sample\"}\n"
        );
    }

    #[test]
    fn test_stream_line_uses_tick_time() {
        let line = WireFormat::Stream.encode(&envelope(), tick_time()).unwrap();
        assert!(line.ends_with(b"\n"));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let record: StreamRecord = serde_json::from_slice(&line).unwrap();
        assert_eq!(record.ts, 1_700_000_000);
        assert_eq!(record.time_iso, "2024-01-01T00:00:05Z");
        assert_eq!(record.label, "porch");
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let a = WireFormat::Peer.encode(&envelope(), tick_time()).unwrap();
        let b = WireFormat::Peer.encode(&envelope(), tick_time()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_brightness_encodes_as_null() {
        let mut env = envelope();
        env.brightness = f64::NAN;
        let line = WireFormat::Peer.encode(&env, tick_time()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert!(value["brightness"].is_null());
    }
}
