//! Default configuration values
//!
//! Named constants for all tunable parameters

use crate::constants::{api, progression};

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 3000;

/// Default truck speed in miles per hour
pub const DEFAULT_TRUCK_SPEED_MPH: f64 = progression::TRUCK_SPEED_MPH;

/// Default daily driving-hour cap
pub const DEFAULT_DAILY_DRIVING_HOURS: f64 = progression::DAILY_DRIVING_HOURS;

/// Default handling delay in hours
pub const DEFAULT_HANDLING_DELAY_HOURS: f64 = progression::HANDLING_DELAY_HOURS;

/// Default minimum speed in miles per minute
pub const DEFAULT_MIN_MILES_PER_MINUTE: f64 = progression::MIN_MILES_PER_MINUTE;

/// Default progress cap during the handling delay
pub const DEFAULT_HANDLING_CREEP_CAP: f64 = progression::HANDLING_CREEP_CAP;

/// Whether the periodic sweep runs alongside the server
pub const DEFAULT_SWEEP_ENABLED: bool = true;

/// Default sweep interval in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// Default number of shipments refreshed concurrently by a sweep
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 8;

/// Default routing backend
pub const DEFAULT_ROUTING_BACKEND: &str = "osrm";

/// Default OSRM base URL
pub const DEFAULT_OSRM_URL: &str = api::OSRM_URL;

/// Default routing request timeout in seconds
pub const DEFAULT_ROUTING_TIMEOUT_SECS: u64 = 10;

/// Default route cache capacity
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 1024;

/// Default reverse geocoding backend
pub const DEFAULT_GEOCODING_BACKEND: &str = "static";

/// Default radius for nearest-city lookups, in miles
pub const DEFAULT_MAX_CITY_DISTANCE_MILES: f64 = 30.0;

/// Default nearest-city cache capacity
pub const DEFAULT_LABEL_CACHE_CAPACITY: usize = 4096;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Shipments data file name
pub const SHIPMENTS_FILE_NAME: &str = "shipments.json";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "cargowatch";
