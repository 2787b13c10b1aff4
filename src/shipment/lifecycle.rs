//! Shipment lifecycle transitions
//!
//! Creation, status changes, pause/resume and manual location overrides. Every
//! transition takes `now` explicitly and appends a journal entry.

use super::{
    generate_tracking_id, hours_to_duration, Address, CurrentLocation, PackageInfo, Party,
    Shipment, ShipmentStatus,
};
use crate::constants::labels::{DEFAULT_COUNTRY, DEFAULT_PAUSE_REASON, MANUAL_OVERRIDE_REASON};
use crate::constants::progression::{ESTIMATE_OVERHEAD_HOURS, ESTIMATE_SPEED_MPH};
use crate::coord::point::haversine_miles;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::cities::parse_location_input;
use crate::geo::CoordinateResolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request body for a new shipment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewShipment {
    pub sender: Party,
    pub recipient: Party,
    pub package: PackageInfo,
    /// Initial status; `pending` when absent
    pub status: Option<ShipmentStatus>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Spread a free-text city ("Buea, South-West, CM") over the blank address
/// fields
fn expand_city_input(address: &mut Address) {
    if !address.city.contains(',') {
        return;
    }
    let parts = parse_location_input(&address.city);
    address.city = parts.city;
    for (field, parsed) in [
        (&mut address.state, parts.state),
        (&mut address.zip_code, parts.zip_code),
        (&mut address.country, parts.country),
    ] {
        if field.trim().is_empty() {
            *field = parsed;
        }
    }
}

/// Fill in missing coordinates of an address, keeping any given explicitly
fn geocode_address<R: CoordinateResolver + ?Sized>(
    address: &mut Address,
    resolver: &R,
) -> Result<Option<Coordinates>> {
    expand_city_input(address);
    if address.country.trim().is_empty() {
        address.country = DEFAULT_COUNTRY.to_string();
    }
    if let Some(coords) = address.coordinates() {
        coords.validate()?;
        return Ok(Some(coords));
    }
    let coords = resolver.resolve_address(address);
    address.set_coordinates(coords);
    Ok(coords)
}

impl Shipment {
    /// Create a shipment from a request
    pub fn new<R: CoordinateResolver + ?Sized>(
        request: NewShipment,
        resolver: &R,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let NewShipment {
            mut sender,
            mut recipient,
            package,
            status,
            estimated_delivery,
        } = request;

        if sender.address.city.trim().is_empty() {
            return Err(Error::InvalidShipment("Sender city is required".to_string()));
        }
        if recipient.address.city.trim().is_empty() {
            return Err(Error::InvalidShipment("Recipient city is required".to_string()));
        }

        let status = status.unwrap_or_default();
        if status == ShipmentStatus::Delivered {
            return Err(Error::InvalidShipment(
                "A shipment cannot be created as delivered".to_string(),
            ));
        }

        let origin = geocode_address(&mut sender.address, resolver)?;
        let destination = geocode_address(&mut recipient.address, resolver)?;
        if origin.is_none() {
            debug!("No coordinates for origin {}", sender.address.display());
        }
        if destination.is_none() {
            debug!("No coordinates for destination {}", recipient.address.display());
        }

        let estimated_delivery = estimated_delivery.or_else(|| {
            let (o, d) = (origin?, destination?);
            let hours = haversine_miles(o, d) / ESTIMATE_SPEED_MPH + ESTIMATE_OVERHEAD_HOURS;
            Some(now + hours_to_duration(hours))
        });

        let mut shipment = Shipment {
            id: uuid::Uuid::new_v4().to_string(),
            tracking_id: generate_tracking_id(now),
            status,
            created_at: Some(now),
            updated_at: Some(now),
            delivered_at: None,
            current_location: CurrentLocation::at(origin, sender.address.city.clone()),
            sender,
            recipient,
            package,
            events: Vec::new(),
            estimated_delivery,
            route_geometry: None,
            route_distance_miles: None,
            auto_progress: Default::default(),
            version: 0,
        };

        if status.is_active() && origin.is_some() && destination.is_some() {
            shipment.auto_progress.started_at = Some(now);
        }

        let description = match status {
            ShipmentStatus::Pending => "Your shipment has been created and is awaiting pickup",
            other => other.default_description(),
        };
        let location = shipment.sender.address.city.clone();
        shipment.push_event(status, "Shipment Created", description, &location, now);

        info!(
            "Created shipment {} ({} -> {})",
            shipment.tracking_id,
            shipment.sender.address.display(),
            shipment.recipient.address.display()
        );
        Ok(shipment)
    }

    /// Move the shipment to `status`
    ///
    /// An explicit `location` on a non-terminal, non-pending status is a manual
    /// override.
    pub fn apply_status<R: CoordinateResolver + ?Sized>(
        &mut self,
        status: ShipmentStatus,
        location: Option<&str>,
        description: Option<&str>,
        resolver: &R,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let location = location.map(str::trim).filter(|l| !l.is_empty());
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(status.default_description());

        let event_location = location
            .map(str::to_string)
            .unwrap_or_else(|| self.current_location.city.clone());
        self.push_event(status, status.title(), description, &event_location, now);

        let was_pending = self.status == ShipmentStatus::Pending;
        let endpoints_known = self.origin().is_some() && self.destination().is_some();
        let starting = was_pending && status.is_active() && self.auto_progress.started_at.is_none();
        if starting && endpoints_known {
            let progress = &mut self.auto_progress;
            progress.started_at = Some(now);
            progress.enabled = true;
            progress.paused = false;
            progress.paused_at = None;
            progress.pause_reason = None;
            // Pauses belong to the run they interrupted
            progress.paused_duration = 0;
            self.current_location.manual = false;
            info!("{}: auto-progression started ({})", self.tracking_id, status);
        }

        match status {
            ShipmentStatus::Delivered => {
                let city = if self.recipient.address.city.trim().is_empty() {
                    location.unwrap_or_default().to_string()
                } else {
                    self.recipient.address.city.clone()
                };
                let coords = self
                    .destination()
                    .or_else(|| resolver.resolve_address(&self.recipient.address));
                self.current_location = CurrentLocation::at(coords, city);
                self.delivered_at = Some(now);
            }
            ShipmentStatus::Pending => {
                let city = if self.sender.address.city.trim().is_empty() {
                    location.unwrap_or_default().to_string()
                } else {
                    self.sender.address.city.clone()
                };
                let coords = self
                    .origin()
                    .or_else(|| resolver.resolve_address(&self.sender.address));
                self.current_location = CurrentLocation::at(coords, city);
                self.auto_progress.started_at = None;
                self.auto_progress.paused_duration = 0;
            }
            _ => {
                if let Some(location) = location {
                    self.status = status;
                    let coords = resolver.resolve(location);
                    return self.set_manual_location(location, coords, now);
                }
            }
        }

        self.status = status;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Pause auto-progression
    pub fn pause(&mut self, reason: Option<&str>, now: DateTime<Utc>) -> Result<()> {
        if self.auto_progress.paused {
            return Err(Error::InvalidTransition(format!(
                "Shipment {} is already paused",
                self.tracking_id
            )));
        }
        if self.status == ShipmentStatus::Delivered {
            return Err(Error::InvalidTransition(format!(
                "Shipment {} is already delivered",
                self.tracking_id
            )));
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let progress = &mut self.auto_progress;
        progress.paused = true;
        progress.paused_at = Some(now);
        progress.pause_reason = Some(reason.unwrap_or(DEFAULT_PAUSE_REASON).to_string());

        let description = reason
            .map(str::to_string)
            .unwrap_or_else(|| "Shipment paused for maintenance".to_string());
        let location = self.current_location.city.clone();
        self.push_event(ShipmentStatus::Exception, "Shipment Paused", &description, &location, now);
        self.updated_at = Some(now);

        info!(
            "Shipment {} paused: {}",
            self.tracking_id,
            reason.unwrap_or(DEFAULT_PAUSE_REASON)
        );
        Ok(())
    }

    /// Resume auto-progression, folding the open pause into `paused_duration`
    ///
    /// Also releases a manual location override.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.auto_progress.paused {
            return Err(Error::InvalidTransition(format!(
                "Shipment {} is not paused",
                self.tracking_id
            )));
        }

        let progress = &mut self.auto_progress;
        if let Some(paused_at) = progress.paused_at.take() {
            let paused_ms = (now - paused_at).num_milliseconds().max(0);
            progress.paused_duration = progress.paused_duration.saturating_add(paused_ms);
        }
        progress.paused = false;
        let reason = progress
            .pause_reason
            .take()
            .unwrap_or_else(|| "maintenance".to_string());
        self.current_location.manual = false;

        let description = format!("Shipment resumed after: {}", reason);
        let location = self.current_location.city.clone();
        self.push_event(
            ShipmentStatus::InTransit,
            "Shipment Resumed",
            &description,
            &location,
            now,
        );
        self.updated_at = Some(now);

        info!("Shipment {} resumed after: {}", self.tracking_id, reason);
        Ok(())
    }

    /// Set the location by hand
    ///
    /// The override sticks until [`Shipment::resume`]; running progression is
    /// paused so the simulated position does not jump back.
    pub fn set_manual_location(
        &mut self,
        city: &str,
        coords: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let city = city.trim();
        if city.is_empty() {
            return Err(Error::InvalidShipment("Location city is required".to_string()));
        }
        if let Some(c) = coords {
            c.validate()?;
        }

        let coords = coords.or_else(|| self.current_location.coordinates());
        self.current_location = CurrentLocation {
            lat: coords.map(|c| c.lat),
            lng: coords.map(|c| c.lng),
            city: city.to_string(),
            manual: true,
        };
        self.updated_at = Some(now);
        info!("{}: manual location set to {}", self.tracking_id, city);

        let running = self.auto_progress.enabled && !self.auto_progress.paused;
        if running && self.status != ShipmentStatus::Delivered {
            self.pause(Some(MANUAL_OVERRIDE_REASON), now)?;
        }
        Ok(())
    }
}
