//! SensorSource trait - Sensor Reader abstraction
//!
//! Decouples the broadcast loop from the concrete upstream (HTTP or mock).

use crate::{ContractError, RawReading};

/// Source of raw readings
///
/// One call performs exactly one upstream request. Implementations never
/// retry; the caller treats a failure as "skip this tick".
#[trait_variant::make(SensorSource: Send)]
pub trait LocalSensorSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Fetch one reading
    ///
    /// # Errors
    /// `Fetch` when the endpoint is unreachable or answers with a non-success
    /// status, `Decode` when the body does not have the reading shape.
    async fn fetch(&self) -> Result<RawReading, ContractError>;
}
