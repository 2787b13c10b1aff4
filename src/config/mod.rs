//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/cargowatch/config.toml

pub mod defaults;

use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Progression model parameters
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Periodic sweep settings
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Route provider settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Reverse geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Parameters of the simulated trucking model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Cruising speed in miles per hour
    #[serde(default = "default_truck_speed")]
    pub truck_speed_mph: f64,

    /// Driving hours credited per 24-hour day
    #[serde(default = "default_daily_driving_hours")]
    pub daily_driving_hours: f64,

    /// Hours before the vehicle starts moving
    #[serde(default = "default_handling_delay")]
    pub handling_delay_hours: f64,

    /// Minimum speed guarantee in miles per minute
    #[serde(default = "default_min_miles_per_minute")]
    pub min_miles_per_minute: f64,

    /// Progress reported at the end of the handling delay
    #[serde(default = "default_handling_creep_cap")]
    pub handling_creep_cap: f64,
}

/// Periodic sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Run the sweep alongside the server
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,

    /// Shipments refreshed concurrently
    #[serde(default = "default_sweep_concurrency")]
    pub max_concurrency: usize,
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; the XDG data directory is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Route provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Backend name: "osrm" or "none"
    #[serde(default = "default_routing_backend")]
    pub backend: String,

    /// OSRM base URL
    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of cached routes
    #[serde(default = "default_route_cache_capacity")]
    pub cache_capacity: usize,
}

/// Reverse geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Backend name: "static" or "nominatim"
    #[serde(default = "default_geocoding_backend")]
    pub backend: String,

    /// Farthest a city may be from a point to label it, in miles
    #[serde(default = "default_max_city_distance")]
    pub max_distance_miles: f64,

    /// Maximum number of cached labels
    #[serde(default = "default_label_cache_capacity")]
    pub cache_capacity: usize,
}

// Default value functions for serde
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_truck_speed() -> f64 {
    DEFAULT_TRUCK_SPEED_MPH
}
fn default_daily_driving_hours() -> f64 {
    DEFAULT_DAILY_DRIVING_HOURS
}
fn default_handling_delay() -> f64 {
    DEFAULT_HANDLING_DELAY_HOURS
}
fn default_min_miles_per_minute() -> f64 {
    DEFAULT_MIN_MILES_PER_MINUTE
}
fn default_handling_creep_cap() -> f64 {
    DEFAULT_HANDLING_CREEP_CAP
}
fn default_sweep_enabled() -> bool {
    DEFAULT_SWEEP_ENABLED
}
fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}
fn default_sweep_concurrency() -> usize {
    DEFAULT_SWEEP_CONCURRENCY
}
fn default_routing_backend() -> String {
    DEFAULT_ROUTING_BACKEND.to_string()
}
fn default_osrm_url() -> String {
    DEFAULT_OSRM_URL.to_string()
}
fn default_routing_timeout() -> u64 {
    DEFAULT_ROUTING_TIMEOUT_SECS
}
fn default_route_cache_capacity() -> usize {
    DEFAULT_ROUTE_CACHE_CAPACITY
}
fn default_geocoding_backend() -> String {
    DEFAULT_GEOCODING_BACKEND.to_string()
}
fn default_max_city_distance() -> f64 {
    DEFAULT_MAX_CITY_DISTANCE_MILES
}
fn default_label_cache_capacity() -> usize {
    DEFAULT_LABEL_CACHE_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            truck_speed_mph: default_truck_speed(),
            daily_driving_hours: default_daily_driving_hours(),
            handling_delay_hours: default_handling_delay(),
            min_miles_per_minute: default_min_miles_per_minute(),
            handling_creep_cap: default_handling_creep_cap(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval_secs: default_sweep_interval(),
            max_concurrency: default_sweep_concurrency(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            backend: default_routing_backend(),
            osrm_url: default_osrm_url(),
            timeout_secs: default_routing_timeout(),
            cache_capacity: default_route_cache_capacity(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            backend: default_geocoding_backend(),
            max_distance_miles: default_max_city_distance(),
            cache_capacity: default_label_cache_capacity(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["progression", "truck_speed_mph"] => {
                Some(self.progression.truck_speed_mph.to_string())
            }
            ["progression", "daily_driving_hours"] => {
                Some(self.progression.daily_driving_hours.to_string())
            }
            ["progression", "handling_delay_hours"] => {
                Some(self.progression.handling_delay_hours.to_string())
            }
            ["progression", "min_miles_per_minute"] => {
                Some(self.progression.min_miles_per_minute.to_string())
            }
            ["progression", "handling_creep_cap"] => {
                Some(self.progression.handling_creep_cap.to_string())
            }

            ["sweep", "enabled"] => Some(self.sweep.enabled.to_string()),
            ["sweep", "interval_secs"] => Some(self.sweep.interval_secs.to_string()),
            ["sweep", "max_concurrency"] => Some(self.sweep.max_concurrency.to_string()),

            ["storage", "data_dir"] => Some(
                self.storage
                    .data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),

            ["routing", "backend"] => Some(self.routing.backend.clone()),
            ["routing", "osrm_url"] => Some(self.routing.osrm_url.clone()),
            ["routing", "timeout_secs"] => Some(self.routing.timeout_secs.to_string()),
            ["routing", "cache_capacity"] => Some(self.routing.cache_capacity.to_string()),

            ["geocoding", "backend"] => Some(self.geocoding.backend.clone()),
            ["geocoding", "max_distance_miles"] => {
                Some(self.geocoding.max_distance_miles.to_string())
            }
            ["geocoding", "cache_capacity"] => Some(self.geocoding.cache_capacity.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = parse_value(key, value)?;
            }

            ["progression", "truck_speed_mph"] => {
                self.progression.truck_speed_mph = parse_non_negative(key, value)?;
            }
            ["progression", "daily_driving_hours"] => {
                let hours = parse_non_negative(key, value)?;
                if hours > 24.0 {
                    return Err(Error::Config(format!(
                        "Invalid value for {}: {} exceeds 24 hours",
                        key, value
                    )));
                }
                self.progression.daily_driving_hours = hours;
            }
            ["progression", "handling_delay_hours"] => {
                self.progression.handling_delay_hours = parse_non_negative(key, value)?;
            }
            ["progression", "min_miles_per_minute"] => {
                self.progression.min_miles_per_minute = parse_non_negative(key, value)?;
            }
            ["progression", "handling_creep_cap"] => {
                let cap = parse_non_negative(key, value)?;
                if cap > 1.0 {
                    return Err(Error::Config(format!(
                        "Invalid value for {}: {} exceeds 1.0",
                        key, value
                    )));
                }
                self.progression.handling_creep_cap = cap;
            }

            ["sweep", "enabled"] => {
                self.sweep.enabled = parse_value(key, value)?;
            }
            ["sweep", "interval_secs"] => {
                self.sweep.interval_secs = parse_value(key, value)?;
            }
            ["sweep", "max_concurrency"] => {
                self.sweep.max_concurrency = parse_value(key, value)?;
            }

            ["storage", "data_dir"] => {
                self.storage.data_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            ["routing", "backend"] => {
                self.routing.backend = value.to_string();
            }
            ["routing", "osrm_url"] => {
                self.routing.osrm_url = value.trim_end_matches('/').to_string();
            }
            ["routing", "timeout_secs"] => {
                self.routing.timeout_secs = parse_value(key, value)?;
            }
            ["routing", "cache_capacity"] => {
                self.routing.cache_capacity = parse_value(key, value)?;
            }

            ["geocoding", "backend"] => {
                self.geocoding.backend = value.to_string();
            }
            ["geocoding", "max_distance_miles"] => {
                self.geocoding.max_distance_miles = parse_non_negative(key, value)?;
            }
            ["geocoding", "cache_capacity"] => {
                self.geocoding.cache_capacity = parse_value(key, value)?;
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "server.host",
            "server.port",
            "progression.truck_speed_mph",
            "progression.daily_driving_hours",
            "progression.handling_delay_hours",
            "progression.min_miles_per_minute",
            "progression.handling_creep_cap",
            "sweep.enabled",
            "sweep.interval_secs",
            "sweep.max_concurrency",
            "storage.data_dir",
            "routing.backend",
            "routing.osrm_url",
            "routing.timeout_secs",
            "routing.cache_capacity",
            "geocoding.backend",
            "geocoding.max_distance_miles",
            "geocoding.cache_capacity",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Directory holding the shipments file
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }

    /// Full path of the shipments file
    pub fn shipments_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(SHIPMENTS_FILE_NAME))
    }

    /// Sweep interval as a duration (never zero)
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep.interval_secs.max(1))
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_non_negative(key: &str, value: &str) -> Result<f64> {
    let parsed: f64 = parse_value(key, value)?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(Error::Config(format!("Invalid value for {}: {}", key, value)));
    }
    Ok(parsed)
}
