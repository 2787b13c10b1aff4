//! Output formatters
//!
//! Provides trait-based output formatting for tracking reports.

pub mod gpx;
pub mod json;
pub mod text;

use crate::error::Result;
use crate::shipment::Shipment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// A shipment as seen at one moment, ready to print
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub shipment: Shipment,
    /// Fraction of the trip covered, when the shipment is moving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

impl TrackingReport {
    pub fn new(shipment: Shipment, progress: Option<f64>, generated_at: DateTime<Utc>) -> Self {
        Self {
            shipment,
            progress,
            generated_at,
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a tracking report
    fn format(&self, report: &TrackingReport) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "gpx" => Some(Box::new(gpx::GpxFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    let formatters: [&dyn OutputFormatter; 3] =
        [&json::JsonFormatter, &text::TextFormatter, &gpx::GpxFormatter];
    formatters
        .iter()
        .map(|f| FormatInfo {
            name: f.name().to_string(),
            description: f.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::coord::Coordinates;
    use crate::progress::tests::{shipment_between, t0};
    use chrono::Duration;

    pub(crate) fn sample_report() -> TrackingReport {
        let mut shipment =
            shipment_between(Coordinates::new(4.0511, 9.7679), Coordinates::new(3.848, 11.5021));
        shipment.route_geometry = Some(vec![[4.0511, 9.7679], [3.8, 10.1333], [3.848, 11.5021]]);
        shipment.route_distance_miles = Some(150.0);
        shipment.current_location.city = "Edéa, Littoral".to_string();
        shipment.current_location.lat = Some(3.8);
        shipment.current_location.lng = Some(10.1333);
        TrackingReport::new(shipment, Some(0.4), t0() + Duration::hours(5))
    }

    #[test]
    fn test_get_formatter() {
        assert!(get_formatter("json").is_some());
        assert!(get_formatter("text").is_some());
        assert!(get_formatter("gpx").is_some());
        assert!(get_formatter("url").is_none());
        assert!(get_formatter("unknown").is_none());
    }

    #[test]
    fn test_get_formatter_case_insensitive() {
        assert!(get_formatter("JSON").is_some());
        assert!(get_formatter("Text").is_some());
        assert!(get_formatter("GPX").is_some());
    }

    #[test]
    fn test_available_formats() {
        let formats = available_formats();
        assert_eq!(formats.len(), 3);
        for format in &formats {
            assert!(get_formatter(&format.name).is_some());
        }
    }
}
