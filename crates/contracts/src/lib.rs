//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the seller node.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Sensor readings carry seconds since the Unix epoch (`f64`, may be absent)
//! - Envelopes carry a normalized integer epoch plus its RFC 3339 rendering

mod broadcast_config;
mod envelope;
mod error;
mod identity;
mod node_config;
mod reading;
mod sensor_source;
mod sink;
mod transport;

pub use broadcast_config::*;
pub use envelope::*;
pub use error::*;
pub use identity::SellerIdentity;
pub use node_config::*;
pub use reading::RawReading;
pub use sensor_source::{LocalSensorSource, SensorSource};
pub use sink::*;
pub use transport::*;
