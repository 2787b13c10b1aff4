//! Centralized constants for the cargowatch crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in miles
    pub const EARTH_RADIUS_MILES: f64 = 3959.0;

    /// Miles per metre
    pub const MILES_PER_METER: f64 = 0.000_621_371;
}

/// Progression model constants
pub mod progression {
    /// Simulated truck cruising speed
    pub const TRUCK_SPEED_MPH: f64 = 55.0;

    /// Minimum speed guarantee, in miles per minute of driving window
    pub const MIN_MILES_PER_MINUTE: f64 = 1.0;

    /// Daily driving-hour cap (duty cycle)
    pub const DAILY_DRIVING_HOURS: f64 = 11.0;

    /// Grace period after pickup before the vehicle moves
    pub const HANDLING_DELAY_HOURS: f64 = 4.0;

    /// Largest progress fraction reported during the handling delay
    pub const HANDLING_CREEP_CAP: f64 = 0.05;

    /// Average speed used for the initial delivery estimate
    pub const ESTIMATE_SPEED_MPH: f64 = 50.0;

    /// Fixed overhead added to the initial delivery estimate
    pub const ESTIMATE_OVERHEAD_HOURS: f64 = 8.0;
}

/// Location labels
pub mod labels {
    /// Label used when no known city is near the computed point
    pub const IN_TRANSIT: &str = "In Transit";

    /// Label used at the destination when the recipient city is blank
    pub const DESTINATION: &str = "Destination";

    /// Default country code for parsed location input
    pub const DEFAULT_COUNTRY: &str = "CM";

    /// Pause reason used when none is given
    pub const DEFAULT_PAUSE_REASON: &str = "Maintenance";

    /// Pause reason recorded when an admin sets the location by hand
    pub const MANUAL_OVERRIDE_REASON: &str = "Manual location override";
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// Public OSRM routing demo server
    pub const OSRM_URL: &str = "https://router.project-osrm.org";
}

/// Cache settings
pub mod cache {
    /// Decimal places used for route cache keys
    pub const ROUTE_KEY_DECIMALS: i32 = 5;

    /// Decimal places used for nearest-city cache keys
    pub const LABEL_KEY_DECIMALS: i32 = 3;
}
