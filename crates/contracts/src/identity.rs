//! SellerIdentity - static identity metadata merged into every envelope

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity of this seller node
///
/// Set once at startup and shared read-only (behind `Arc`) for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SellerIdentity {
    /// Seller identifier (also used as the envelope `source`)
    #[validate(length(min = 1, message = "seller_id cannot be empty"))]
    pub seller_id: String,

    /// Human readable location label
    #[validate(length(min = 1, message = "label cannot be empty"))]
    pub label: String,

    /// Latitude in degrees
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]"))]
    pub lat: f64,

    /// Longitude in degrees
    #[validate(range(min = -180.0, max = 180.0, message = "lon must be within [-180, 180]"))]
    pub lon: f64,
}
