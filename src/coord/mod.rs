//! Coordinate geometry
//!
//! This module handles:
//! - Geographic coordinates and validation
//! - Great-circle distance and straight-line interpolation
//! - Position lookup along a route polyline

pub mod point;
pub mod route;

use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.lat.is_finite() || self.lat < -90.0 || self.lat > 90.0 {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || self.lng < -180.0 || self.lng > 180.0 {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Integer grid cell at `decimals` places, usable as a hash key
    pub fn grid_key(&self, decimals: i32) -> (i64, i64) {
        let factor = 10f64.powi(decimals);
        ((self.lat * factor).round() as i64, (self.lng * factor).round() as i64)
    }

    /// Build from a `[lat, lng]` pair
    pub fn from_pair(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    /// Convert to a `[lat, lng]` pair
    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}
