//! Nominatim reverse geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim API at city zoom level.
//! Rate limit: 1 request per second (enforced by User-Agent requirement)

use crate::constants::api::NOMINATIM_URL;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::{CityLabel, ReverseGeocoder};
use serde::Deserialize;

const USER_AGENT: &str = concat!("cargowatch/", env!("CARGO_PKG_VERSION"));

/// Nominatim reverse geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim reverse response
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
}

impl NominatimBackend {
    /// Create a backend against the public Nominatim instance
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Create a backend against a specific Nominatim instance
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Geo(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn reverse_url(&self, point: Coordinates) -> String {
        format!(
            "{}/reverse?lat={}&lon={}&format=json&zoom=10&addressdetails=1",
            self.base_url, point.lat, point.lng
        )
    }

    /// Pick the most specific settlement name from an address block
    fn label_from(address: NominatimAddress) -> Option<CityLabel> {
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .filter(|c| !c.trim().is_empty())?;
        Some(CityLabel {
            city,
            region: address.state.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl ReverseGeocoder for NominatimBackend {
    async fn reverse_geocode(&self, point: Coordinates) -> Result<Option<CityLabel>> {
        let response = self
            .client
            .get(self.reverse_url(point))
            .send()
            .await
            .map_err(|e| Error::Geo(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            return Err(Error::Geo(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let result: NominatimReverse = response
            .json()
            .await
            .map_err(|e| Error::Geo(format!("Failed to parse Nominatim response: {}", e)))?;

        Ok(result.address.and_then(Self::label_from))
    }
}
