//! Geographic collaborators
//!
//! Coordinate resolution from the static city table, reverse geocoding of
//! coordinates to a city label, and road routes between two points.

pub mod cache;
pub mod cities;
pub mod nominatim;
pub mod osrm;

use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::shipment::Address;
use cities::CityIndex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// A human-readable place name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityLabel {
    pub city: String,
    pub region: Option<String>,
}

impl CityLabel {
    /// Format as "City, Region" (or just "City")
    pub fn display(&self) -> String {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => format!("{}, {}", self.city, region),
            _ => self.city.clone(),
        }
    }
}

/// A road route between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Ordered `[lat, lng]` points
    pub geometry: Vec<[f64; 2]>,
    pub distance_miles: f64,
    pub duration_seconds: f64,
}

/// Trait for address to coordinate lookups
pub trait CoordinateResolver: Send + Sync {
    /// Resolve free-text input ("Douala, Littoral") to coordinates
    fn resolve(&self, query: &str) -> Option<Coordinates>;

    /// Resolve a structured address to coordinates
    fn resolve_address(&self, address: &Address) -> Option<Coordinates> {
        self.resolve(&address.city)
            .or_else(|| self.resolve(&address.display()))
    }
}

impl CoordinateResolver for CityIndex {
    fn resolve(&self, query: &str) -> Option<Coordinates> {
        CityIndex::resolve(self, query)
    }
}

/// Trait for reverse geocoding backends
pub trait ReverseGeocoder: Send + Sync {
    /// Find the city nearest to a point, or None if nothing is close enough
    fn reverse_geocode(
        &self,
        point: Coordinates,
    ) -> impl Future<Output = Result<Option<CityLabel>>> + Send;
}

/// Trait for road routing backends
pub trait RouteProvider: Send + Sync {
    /// Fetch a driving route, or None if the backend has no route
    fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> impl Future<Output = Result<Option<Route>>> + Send;
}

/// Reverse geocoding against the static city table
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    index: Arc<CityIndex>,
    max_distance_miles: f64,
}

impl StaticGeocoder {
    pub fn new(index: Arc<CityIndex>, max_distance_miles: f64) -> Self {
        Self { index, max_distance_miles }
    }
}

impl ReverseGeocoder for StaticGeocoder {
    async fn reverse_geocode(&self, point: Coordinates) -> Result<Option<CityLabel>> {
        Ok(self
            .index
            .nearest(point, self.max_distance_miles)
            .map(|city| city.label()))
    }
}

/// Reverse geocoder selected by `geocoding.backend`
#[derive(Debug, Clone)]
pub enum GeocoderBackend {
    Static(StaticGeocoder),
    Nominatim(nominatim::NominatimBackend),
}

impl ReverseGeocoder for GeocoderBackend {
    async fn reverse_geocode(&self, point: Coordinates) -> Result<Option<CityLabel>> {
        match self {
            Self::Static(g) => g.reverse_geocode(point).await,
            Self::Nominatim(g) => g.reverse_geocode(point).await,
        }
    }
}

/// Route provider selected by `routing.backend`
#[derive(Debug, Clone)]
pub enum RouteBackend {
    Osrm(osrm::OsrmRouter),
    /// Never returns a route; positions use straight-line interpolation
    Disabled,
}

impl RouteProvider for RouteBackend {
    async fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Option<Route>> {
        match self {
            Self::Osrm(router) => router.fetch_route(origin, destination).await,
            Self::Disabled => Ok(None),
        }
    }
}

/// Build the configured reverse geocoder
pub fn get_geocoder(config: &Config, index: Arc<CityIndex>) -> Result<GeocoderBackend> {
    match config.geocoding.backend.as_str() {
        "static" => Ok(GeocoderBackend::Static(StaticGeocoder::new(
            index,
            config.geocoding.max_distance_miles,
        ))),
        "nominatim" => Ok(GeocoderBackend::Nominatim(nominatim::NominatimBackend::new()?)),
        other => Err(Error::Config(format!(
            "Unknown geocoding backend: {} (expected static or nominatim)",
            other
        ))),
    }
}

/// Build the configured route provider
pub fn get_router(config: &Config) -> Result<RouteBackend> {
    match config.routing.backend.as_str() {
        "osrm" => Ok(RouteBackend::Osrm(osrm::OsrmRouter::new(
            &config.routing.osrm_url,
            config.routing.timeout_secs,
        )?)),
        "none" => Ok(RouteBackend::Disabled),
        other => Err(Error::Config(format!(
            "Unknown routing backend: {} (expected osrm or none)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_label_display() {
        let label = CityLabel {
            city: "Douala".to_string(),
            region: Some("Littoral".to_string()),
        };
        assert_eq!(label.display(), "Douala, Littoral");

        let bare = CityLabel {
            city: "Douala".to_string(),
            region: None,
        };
        assert_eq!(bare.display(), "Douala");
    }

    #[tokio::test]
    async fn test_static_geocoder() {
        let geocoder = StaticGeocoder::new(Arc::new(CityIndex::new()), 30.0);

        let label = geocoder
            .reverse_geocode(Coordinates::new(3.85, 11.50))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(label.display(), "Yaoundé, Centre");

        let nothing = geocoder
            .reverse_geocode(Coordinates::new(-40.0, 120.0))
            .await
            .unwrap();
        assert!(nothing.is_none());
    }

    #[tokio::test]
    async fn test_disabled_router() {
        let route = RouteBackend::Disabled
            .fetch_route(Coordinates::new(4.0, 9.7), Coordinates::new(3.8, 11.5))
            .await
            .unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn test_backend_selection() {
        let index = Arc::new(CityIndex::new());
        let mut config = Config::default();

        config.routing.backend = "none".to_string();
        assert!(matches!(get_router(&config).unwrap(), RouteBackend::Disabled));

        config.routing.backend = "carrier-pigeon".to_string();
        assert!(get_router(&config).is_err());

        assert!(matches!(
            get_geocoder(&config, index.clone()).unwrap(),
            GeocoderBackend::Static(_)
        ));

        config.geocoding.backend = "magic".to_string();
        assert!(get_geocoder(&config, index).is_err());
    }
}
