//! Envelope builder - pure merge of identity, reading and time.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{BroadcastEnvelope, RawReading, SellerIdentity};

/// Normalize a raw sensor timestamp
///
/// `floor(ts)` is used when it is a positive, finite, representable instant;
/// otherwise `now` (truncated to whole seconds) is used for both outputs.
pub fn normalize_timestamp(ts: Option<f64>, now: DateTime<Utc>) -> (i64, DateTime<Utc>) {
    let from_reading = ts
        .filter(|t| t.is_finite())
        .map(f64::floor)
        .filter(|t| *t > 0.0 && *t <= i64::MAX as f64)
        .and_then(|t| {
            let epoch = t as i64;
            DateTime::from_timestamp(epoch, 0).map(|at| (epoch, at))
        });

    match from_reading {
        Some(pair) => pair,
        None => {
            let epoch = now.timestamp();
            let at = DateTime::from_timestamp(epoch, 0).unwrap_or(now);
            (epoch, at)
        }
    }
}

/// RFC 3339 with whole seconds and a `Z` suffix
pub fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build one envelope
pub fn build_envelope(
    identity: &SellerIdentity,
    reading: &RawReading,
    sample_kind: &str,
    now: DateTime<Utc>,
) -> BroadcastEnvelope {
    let (ts, at) = normalize_timestamp(reading.ts, now);

    BroadcastEnvelope {
        ts,
        ts_iso: format_iso(at),
        brightness: reading.brightness,
        seller_id: identity.seller_id.clone(),
        source: identity.seller_id.clone(),
        label: identity.label.clone(),
        lat: identity.lat,
        lon: identity.lon,
        kind: sample_kind.to_string(),
    }
}

/// Envelope builder bound to one identity and sample kind
///
/// Cheap to clone; the identity is shared read-only.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    identity: Arc<SellerIdentity>,
    sample_kind: String,
}

impl EnvelopeBuilder {
    pub fn new(identity: Arc<SellerIdentity>, sample_kind: impl Into<String>) -> Self {
        Self {
            identity,
            sample_kind: sample_kind.into(),
        }
    }

    pub fn identity(&self) -> &SellerIdentity {
        &self.identity
    }

    pub fn sample_kind(&self) -> &str {
        &self.sample_kind
    }

    pub fn build(&self, reading: &RawReading, now: DateTime<Utc>) -> BroadcastEnvelope {
        build_envelope(&self.identity, reading, &self.sample_kind, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn porch() -> SellerIdentity {
        SellerIdentity {
            seller_id: "pi-1".to_string(),
            label: "porch".to_string(),
            lat: 51.5,
            lon: -0.12,
        }
    }

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_build_with_valid_timestamp() {
        let reading = RawReading::new(1_700_000_000.0, 0.42);
        let envelope = build_envelope(&porch(), &reading, "brightness_sample", new_year());

        assert_eq!(
            envelope,
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
        );
    }

    #[test]
    fn test_fractional_timestamp_is_truncated() {
        let (ts, at) = normalize_timestamp(Some(1_700_000_000.987), new_year());
        assert_eq!(ts, 1_700_000_000);
        assert_eq!(format_iso(at), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_zero_timestamp_uses_now() {
        let reading = RawReading::new(0.0, 0.10);
        let envelope = build_envelope(&porch(), &reading, "brightness_sample", new_year());
        assert_eq!(envelope.ts, new_year().timestamp());
        assert_eq!(envelope.ts_iso, "2024-01-01T00:00:00Z");
        assert_eq!(envelope.brightness, 0.10);
    }

    #[test]
    fn test_invalid_timestamps_use_now() {
        let now = new_year();
        for ts in [
            None,
            Some(-5.0),
            Some(0.4),
            Some(f64::NAN),
            Some(f64::INFINITY),
            Some(1e300),
        ] {
            let (epoch, at) = normalize_timestamp(ts, now);
            assert_eq!(epoch, now.timestamp(), "ts={ts:?}");
            assert_eq!(at, now, "ts={ts:?}");
        }
    }

    #[test]
    fn test_now_subseconds_are_dropped() {
        let now = Utc.timestamp_opt(1_704_067_200, 750_000_000).unwrap();
        let (epoch, at) = normalize_timestamp(None, now);
        assert_eq!(epoch, 1_704_067_200);
        assert_eq!(format_iso(at), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_builder_is_deterministic() {
        let builder = EnvelopeBuilder::new(Arc::new(porch()), "brightness_sample");
        let reading = RawReading::untimed(7.25);
        let first = builder.build(&reading, new_year());
        let second = builder.build(&reading, new_year());
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}
