//! RawReading - Sensor Reader output

use serde::{Deserialize, Serialize};

/// One raw sample from the upstream sensor service
///
/// Wire shape: `{ "ts": <number>, "brightness": <number> }`.
/// `ts` may be missing, null, zero or otherwise unusable; the envelope builder
/// substitutes wall-clock time in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// Seconds since the Unix epoch as reported by the sensor
    #[serde(default)]
    pub ts: Option<f64>,

    /// Brightness value
    pub brightness: f64,
}

impl RawReading {
    /// Create a reading with an explicit timestamp
    pub fn new(ts: f64, brightness: f64) -> Self {
        Self {
            ts: Some(ts),
            brightness,
        }
    }

    /// Create a reading without a timestamp
    pub fn untimed(brightness: f64) -> Self {
        Self {
            ts: None,
            brightness,
        }
    }
}
