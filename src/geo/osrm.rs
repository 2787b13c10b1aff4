//! OSRM route provider
//!
//! Queries the OSRM `route` service for a driving polyline in GeoJSON form.

use crate::constants::geo::MILES_PER_METER;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::{Route, RouteProvider};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// OSRM HTTP client
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouter {
    /// Create a router against `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Routing(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, origin: Coordinates, destination: Coordinates) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson&alternatives=false",
            self.base_url, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }

    /// Convert a decoded OSRM response into a route, if it has one
    fn to_route(response: OsrmResponse) -> Option<Route> {
        if response.code != "Ok" {
            debug!("OSRM returned code {}", response.code);
            return None;
        }

        let route = response.routes.into_iter().next()?;
        let geometry: Vec<[f64; 2]> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| [lat, lng])
            .collect();

        if geometry.is_empty() {
            return None;
        }

        Some(Route {
            geometry,
            distance_miles: route.distance * MILES_PER_METER,
            duration_seconds: route.duration,
        })
    }
}

impl RouteProvider for OsrmRouter {
    async fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Option<Route>> {
        let url = self.route_url(origin, destination);
        debug!("Fetching route: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Routing(format!("OSRM request failed: {}", e)))?;

        // OSRM reports "no route" as 400 with a JSON body
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            return Err(Error::Routing(format!("OSRM returned status: {}", status)));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| Error::Routing(format!("Failed to parse OSRM response: {}", e)))?;

        Ok(Self::to_route(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_route_url() {
        let router = OsrmRouter::new("http://localhost:5000/", 5).unwrap();
        let url = router.route_url(Coordinates::new(4.05, 9.77), Coordinates::new(3.85, 11.5));
        assert_eq!(
            url,
            "http://localhost:5000/route/v1/driving/9.77,4.05;11.5,3.85?overview=full&geometries=geojson&alternatives=false"
        );
    }

    #[test]
    fn test_to_route_swaps_axes_and_converts_distance() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "geometry": {"type": "LineString", "coordinates": [[9.77, 4.05], [10.5, 3.9], [11.5, 3.85]]},
                "distance": 241402.0,
                "duration": 12600.0
            }]
        }"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        let route = OsrmRouter::to_route(response).unwrap();

        assert_eq!(route.geometry[0], [4.05, 9.77]);
        assert_eq!(route.geometry[2], [3.85, 11.5]);
        assert_relative_eq!(route.distance_miles, 150.0, epsilon = 0.01);
        assert_relative_eq!(route.duration_seconds, 12600.0);
    }

    #[test]
    fn test_to_route_no_route() {
        let response: OsrmResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "message": "Impossible route"}"#).unwrap();
        assert!(OsrmRouter::to_route(response).is_none());

        let response: OsrmResponse =
            serde_json::from_str(r#"{"code": "Ok", "routes": []}"#).unwrap();
        assert!(OsrmRouter::to_route(response).is_none());
    }
}
