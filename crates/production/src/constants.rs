//! Production API Constants
//!
//! Endpoint paths and behavioral parameters for the purchase layer.

/// Backend endpoint paths (relative to the configured base URL)
pub mod endpoints {
    /// Generalized purchase-status endpoint (optional `?type=` filter)
    pub const RESOURCE_STATUS: &str = "production/resources/purchase-status/";

    /// Legacy food-only purchase-status endpoint
    pub const FOOD_STATUS: &str = "production/food/purchase-status/";

    /// Generalized buy endpoint
    pub const RESOURCE_BUY: &str = "production/resources/buy/";

    /// Legacy food-only buy endpoint
    pub const FOOD_BUY: &str = "production/food/buy/";
}

/// Behavioral parameters
pub mod params {
    use std::time::Duration;

    /// Default background status refresh cadence
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);
}
