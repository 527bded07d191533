//! # Ingestion
//!
//! Sensor reading ingestion module.
//!
//! Responsibilities:
//! - Fetch one `RawReading` per call from the upstream `/metrics` endpoint
//! - Classify failures as fetch (unreachable / bad status) or decode errors
//! - Expose opaque upstream JSON for the `/status` surface
//! - Provide a scripted `MockSensorSource` for tests
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::SensorSource;
//! use ingestion::HttpSensorSource;
//!
//! let source = HttpSensorSource::new(&config.sensor)?;
//! let reading = source.fetch().await?;
//! ```

mod error;
mod http;
mod mock;

// Re-exports
pub use contracts::{RawReading, SensorSource};
pub use error::{IngestionError, Result};
pub use http::{HttpSensorSource, HEALTH_PATH, METRICS_PATH};
pub use mock::{MockReading, MockSensorSource};
