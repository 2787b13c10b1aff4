//! Shipment records
//!
//! This module handles:
//! - The persisted shipment document (camelCase JSON)
//! - Status values and their journal titles
//! - Lifecycle transitions (see [`lifecycle`])

pub mod lifecycle;

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shipment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 6] = [
        Self::Pending,
        Self::PickedUp,
        Self::InTransit,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Exception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Exception => "exception",
        }
    }

    /// Journal title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Pending => "Pending Pickup",
            Self::PickedUp => "Picked Up",
            Self::InTransit => "In Transit",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Exception => "Exception",
        }
    }

    /// Journal description used when the caller gives none
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::Pending => "Awaiting carrier pickup",
            Self::PickedUp => "Package picked up by carrier",
            Self::InTransit => "Package is in transit",
            Self::OutForDelivery => "Package is out for delivery",
            Self::Delivered => "Package has been delivered",
            Self::Exception => "An exception occurred",
        }
    }

    /// Whether the vehicle is on the road (neither awaiting pickup nor delivered)
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Pending | Self::Delivered)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| Error::InvalidShipment(format!("Unknown status: {}", s)))
    }
}

/// Postal address with optional resolved coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Address {
    /// Coordinates, if both components are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    pub fn set_coordinates(&mut self, coords: Option<Coordinates>) {
        self.lat = coords.map(|c| c.lat);
        self.lng = coords.map(|c| c.lng);
    }

    /// "City, State, Country" with blank parts skipped
    pub fn display(&self) -> String {
        [self.city.as_str(), self.state.as_str(), self.country.as_str()]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sender or recipient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// Package details, carried along but not interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub weight: f64,
    pub description: String,
    pub value: f64,
    pub currency: String,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            kind: "custom".to_string(),
            weight: 0.0,
            description: String::new(),
            value: 0.0,
            currency: "XAF".to_string(),
        }
    }
}

/// Last known position of the package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentLocation {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub city: String,
    /// Set by an admin override; auto-progression leaves it alone
    pub manual: bool,
}

impl CurrentLocation {
    /// An automatically computed location
    pub fn at(coords: Option<Coordinates>, city: impl Into<String>) -> Self {
        Self {
            lat: coords.map(|c| c.lat),
            lng: coords.map(|c| c.lng),
            city: city.into(),
            manual: false,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

/// Auto-progression state
///
/// `paused_duration` holds completed pause intervals only, in milliseconds.
/// An open pause is measured from `paused_at` on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoProgress {
    pub enabled: bool,
    pub paused: bool,
    pub paused_at: Option<DateTime<Utc>>,
    pub pause_reason: Option<String>,
    pub paused_duration: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Default for AutoProgress {
    fn default() -> Self {
        Self {
            enabled: true,
            paused: false,
            paused_at: None,
            pause_reason: None,
            paused_duration: 0,
            started_at: None,
            last_update: None,
        }
    }
}

/// Status-history journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub id: String,
    pub status: ShipmentStatus,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub current: bool,
}

/// A tracked shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub tracking_id: String,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Party,
    #[serde(default)]
    pub recipient: Party,
    #[serde(default)]
    pub package: PackageInfo,
    #[serde(default)]
    pub events: Vec<ShipmentEvent>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_location: CurrentLocation,
    /// Road polyline as `[lat, lng]` pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_geometry: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_distance_miles: Option<f64>,
    #[serde(default)]
    pub auto_progress: AutoProgress,
    /// Optimistic-concurrency counter, bumped on every committed write
    #[serde(default)]
    pub version: u64,
}

impl Shipment {
    /// Sender coordinates
    pub fn origin(&self) -> Option<Coordinates> {
        self.sender.address.coordinates()
    }

    /// Recipient coordinates
    pub fn destination(&self) -> Option<Coordinates> {
        self.recipient.address.coordinates()
    }

    /// When progression started
    ///
    /// Explicit start, else creation time, else the first journal entry past
    /// `pending`.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.auto_progress
            .started_at
            .or(self.created_at)
            .or_else(|| {
                self.events
                    .iter()
                    .find(|e| e.status != ShipmentStatus::Pending)
                    .map(|e| e.timestamp)
            })
    }

    /// Whether a manual override currently owns `current_location`
    pub fn is_manual(&self) -> bool {
        self.current_location.manual
    }

    /// Append a journal entry, closing every earlier one
    pub(crate) fn push_event(
        &mut self,
        status: ShipmentStatus,
        title: &str,
        description: &str,
        location: &str,
        now: DateTime<Utc>,
    ) {
        for event in &mut self.events {
            event.completed = true;
            event.current = false;
        }
        let terminal = status == ShipmentStatus::Delivered;
        self.events.push(ShipmentEvent {
            id: uuid::Uuid::new_v4().to_string(),
            status,
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            timestamp: now,
            completed: terminal,
            current: !terminal,
        });
    }
}

const TRACKING_ID_PREFIX: &str = "CW";
const TRACKING_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TRACKING_ID_RANDOM_LEN: usize = 8;

/// Generate a tracking ID: `CW` + `YYYYMMDD` + 8 random characters
pub fn generate_tracking_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TRACKING_ID_RANDOM_LEN)
        .map(|_| TRACKING_ID_CHARSET[rng.gen_range(0..TRACKING_ID_CHARSET.len())] as char)
        .collect();
    format!("{}{}{}", TRACKING_ID_PREFIX, now.format("%Y%m%d"), suffix)
}

/// Canonical form of a tracking ID (trimmed, uppercase)
pub fn normalize_tracking_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Fractional hours as a chrono duration, saturating at zero on overflow
pub fn hours_to_duration(hours: f64) -> Duration {
    if !hours.is_finite() {
        return Duration::zero();
    }
    Duration::try_milliseconds((hours * 3_600_000.0).round() as i64).unwrap_or_else(Duration::zero)
}

/// Milliseconds as fractional hours
pub fn millis_to_hours(ms: i64) -> f64 {
    ms as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Shipment {
        serde_json::from_str(
            r#"{
                "id": "1",
                "trackingId": "CW20250101ABCDEFGH",
                "status": "in_transit",
                "createdAt": "2025-01-01T08:00:00Z",
                "sender": {"name": "A", "address": {"city": "Douala", "lat": 4.0511, "lng": 9.7679}},
                "recipient": {"name": "B", "address": {"city": "Yaoundé", "lat": 3.848, "lng": 11.5021}},
                "currentLocation": {"lat": 4.0511, "lng": 9.7679, "city": "Douala"},
                "cost": {"total": 1000}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::OutForDelivery).unwrap(),
            "\"out_for_delivery\""
        );
        assert_eq!("Picked_Up".parse::<ShipmentStatus>().unwrap(), ShipmentStatus::PickedUp);
        assert!("lost".parse::<ShipmentStatus>().is_err());
    }

    #[test]
    fn test_status_is_active() {
        assert!(!ShipmentStatus::Pending.is_active());
        assert!(!ShipmentStatus::Delivered.is_active());
        assert!(ShipmentStatus::Exception.is_active());
        assert!(ShipmentStatus::InTransit.is_active());
    }

    #[test]
    fn test_deserialize_partial_document() {
        let shipment = sample();
        assert_eq!(shipment.status, ShipmentStatus::InTransit);
        assert_eq!(shipment.origin(), Some(Coordinates::new(4.0511, 9.7679)));
        assert!(shipment.auto_progress.enabled);
        assert_eq!(shipment.auto_progress.paused_duration, 0);
        assert_eq!(shipment.package.currency, "XAF");
        assert!(!shipment.current_location.manual);
        assert_eq!(shipment.version, 0);
    }

    #[test]
    fn test_serialize_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("trackingId").is_some());
        assert!(json["autoProgress"].get("pausedDuration").is_some());
        assert!(json["sender"]["address"].get("zipCode").is_some());
        assert!(json.get("routeGeometry").is_none());
    }

    #[test]
    fn test_started_at_fallbacks() {
        let mut shipment = sample();
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        assert_eq!(shipment.started_at(), Some(created));

        let explicit = Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap();
        shipment.auto_progress.started_at = Some(explicit);
        assert_eq!(shipment.started_at(), Some(explicit));

        shipment.auto_progress.started_at = None;
        shipment.created_at = None;
        assert_eq!(shipment.started_at(), None);

        let picked = Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap();
        shipment.push_event(ShipmentStatus::Pending, "Created", "", "", created);
        shipment.push_event(ShipmentStatus::PickedUp, "Picked Up", "", "", picked);
        assert_eq!(shipment.started_at(), Some(picked));
    }

    #[test]
    fn test_push_event_closes_earlier_entries() {
        let mut shipment = sample();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        shipment.push_event(ShipmentStatus::PickedUp, "Picked Up", "", "Douala", now);
        shipment.push_event(ShipmentStatus::InTransit, "In Transit", "", "Douala", now);

        assert!(shipment.events[0].completed);
        assert!(!shipment.events[0].current);
        assert!(!shipment.events[1].completed);
        assert!(shipment.events[1].current);
    }

    #[test]
    fn test_generate_tracking_id() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let id = generate_tracking_id(now);
        assert_eq!(id.len(), 18);
        assert!(id.starts_with("CW20250307"));
        assert!(id[10..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(normalize_tracking_id(&id.to_lowercase()), id);
    }

    #[test]
    fn test_hours_to_duration() {
        assert_eq!(hours_to_duration(1.5), Duration::minutes(90));
        assert_eq!(hours_to_duration(f64::NAN), Duration::zero());
        assert!((millis_to_hours(5_400_000) - 1.5).abs() < 1e-12);
    }
}
