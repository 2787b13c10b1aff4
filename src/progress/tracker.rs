//! Progression around the pure engine
//!
//! The `Tracker` owns the route provider, the reverse geocoder and their
//! caches. Lookup failures are logged and fall back to straight-line
//! interpolation or the "In Transit" label; they never fail a refresh.

use super::{compute_position, PositionUpdate};
use crate::config::{Config, ProgressionConfig};
use crate::constants::cache::{LABEL_KEY_DECIMALS, ROUTE_KEY_DECIMALS};
use crate::constants::labels::{DESTINATION, IN_TRANSIT};
use crate::coord::Coordinates;
use crate::error::Result;
use crate::geo::cache::BoundedCache;
use crate::geo::cities::CityIndex;
use crate::geo::{
    get_geocoder, get_router, CityLabel, GeocoderBackend, ReverseGeocoder, Route, RouteBackend,
    RouteProvider,
};
use crate::shipment::{CurrentLocation, Shipment};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

type RouteKey = ((i64, i64), (i64, i64));
type LabelKey = (i64, i64);

/// Route and label caches
#[derive(Debug)]
pub struct Caches {
    /// Keyed by the endpoint pair; `None` records "no route exists"
    pub routes: BoundedCache<RouteKey, Option<Route>>,
    /// Keyed by the point; `None` records "no city nearby"
    pub labels: BoundedCache<LabelKey, Option<CityLabel>>,
}

impl Caches {
    pub fn new(route_capacity: usize, label_capacity: usize) -> Self {
        Self {
            routes: BoundedCache::new(route_capacity),
            labels: BoundedCache::new(label_capacity),
        }
    }
}

/// Positions shipments using a route provider and a reverse geocoder
#[derive(Debug)]
pub struct Tracker<R, G> {
    params: ProgressionConfig,
    router: R,
    geocoder: G,
    caches: Caches,
}

impl Tracker<RouteBackend, GeocoderBackend> {
    /// Build a tracker with the backends named in the configuration
    pub fn from_config(config: &Config, index: Arc<CityIndex>) -> Result<Self> {
        Ok(Self::new(
            config.progression,
            get_router(config)?,
            get_geocoder(config, index)?,
            Caches::new(config.routing.cache_capacity, config.geocoding.cache_capacity),
        ))
    }
}

impl<R: RouteProvider, G: ReverseGeocoder> Tracker<R, G> {
    pub fn new(params: ProgressionConfig, router: R, geocoder: G, caches: Caches) -> Self {
        Self {
            params,
            router,
            geocoder,
            caches,
        }
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Make sure the shipment carries a road route, fetching it once
    ///
    /// Returns whether the shipment has a route afterwards.
    pub async fn ensure_route(&self, shipment: &mut Shipment) -> bool {
        if shipment.route_geometry.as_ref().is_some_and(|g| !g.is_empty()) {
            return true;
        }
        let (Some(origin), Some(destination)) = (shipment.origin(), shipment.destination()) else {
            return false;
        };

        let key = (origin.grid_key(ROUTE_KEY_DECIMALS), destination.grid_key(ROUTE_KEY_DECIMALS));
        let route = match self.caches.routes.get(&key) {
            Some(cached) => cached,
            None => match self.router.fetch_route(origin, destination).await {
                Ok(route) => {
                    self.caches.routes.insert(key, route.clone());
                    route
                }
                Err(e) => {
                    warn!("{}: route lookup failed: {}", shipment.tracking_id, e);
                    return false;
                }
            },
        };

        match route {
            Some(route) if !route.geometry.is_empty() => {
                debug!(
                    "{}: route with {} points, {:.1} miles",
                    shipment.tracking_id,
                    route.geometry.len(),
                    route.distance_miles
                );
                shipment.route_geometry = Some(route.geometry);
                shipment.route_distance_miles = Some(route.distance_miles);
                true
            }
            _ => false,
        }
    }

    /// Label for a point, through the label cache
    pub async fn label_for(&self, point: Coordinates) -> Option<CityLabel> {
        let key = point.grid_key(LABEL_KEY_DECIMALS);
        if let Some(cached) = self.caches.labels.get(&key) {
            return cached;
        }

        match self.geocoder.reverse_geocode(point).await {
            Ok(label) => {
                self.caches.labels.insert(key, label.clone());
                label
            }
            Err(e) => {
                warn!("Reverse geocoding failed for {},{}: {}", point.lat, point.lng, e);
                None
            }
        }
    }

    /// Compute the labelled position of a shipment at `now`
    pub async fn compute_progress(
        &self,
        shipment: &Shipment,
        now: DateTime<Utc>,
    ) -> Option<PositionUpdate> {
        let position = compute_position(shipment, now, &self.params)?;

        let city = if position.terminal {
            let city = shipment.recipient.address.city.trim();
            if city.is_empty() {
                DESTINATION.to_string()
            } else {
                city.to_string()
            }
        } else {
            self.label_for(position.coords)
                .await
                .map(|label| label.display())
                .unwrap_or_else(|| IN_TRANSIT.to_string())
        };

        Some(PositionUpdate {
            lat: position.coords.lat,
            lng: position.coords.lng,
            city,
            progress: position.progress,
            changed: false,
        })
    }

    /// Recompute the position and write it to the shipment
    ///
    /// Leaves a manually set location untouched. The caller persists the
    /// shipment when the returned update is `changed`; a shipment that has
    /// not moved is left exactly as it was.
    pub async fn refresh_position(
        &self,
        shipment: &mut Shipment,
        now: DateTime<Utc>,
    ) -> Option<PositionUpdate> {
        if shipment.is_manual() {
            debug!("{}: manual location, not refreshing", shipment.tracking_id);
            return None;
        }
        // Skip the route lookup for shipments that would not move anyway
        compute_position(shipment, now, &self.params)?;

        let had_route = shipment.route_geometry.as_ref().is_some_and(|g| !g.is_empty());
        let has_route = self.ensure_route(shipment).await;
        let mut update = self.compute_progress(shipment, now).await?;

        let location = CurrentLocation::at(
            Some(Coordinates::new(update.lat, update.lng)),
            update.city.clone(),
        );
        if location == shipment.current_location && has_route == had_route {
            debug!("{}: unchanged at {}", shipment.tracking_id, update.city);
            return Some(update);
        }

        let previous = std::mem::replace(&mut shipment.current_location, location);
        shipment.auto_progress.last_update = Some(now);
        shipment.updated_at = Some(now);
        update.changed = true;

        if previous.city != update.city {
            info!(
                "{}: {} -> {} ({:.1}%)",
                shipment.tracking_id,
                previous.city,
                update.city,
                update.progress * 100.0
            );
        } else {
            debug!(
                "{}: {} ({:.1}%)",
                shipment.tracking_id,
                update.city,
                update.progress * 100.0
            );
        }

        Some(update)
    }
}
