//! Server shared state
//!
//! Holds configuration and shared resources for the HTTP server.

use crate::config::Config;
use crate::error::Result;
use crate::geo::cities::CityIndex;
use crate::geo::{GeocoderBackend, RouteBackend};
use crate::progress::Tracker;
use crate::store::ShipmentStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Tracker wired to the configured backends
pub type LiveTracker = Tracker<RouteBackend, GeocoderBackend>;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    /// Shipment records
    pub store: Arc<ShipmentStore>,

    /// Position computation with route and label lookups
    pub tracker: Arc<LiveTracker>,

    /// Static city table used to resolve addresses
    pub cities: Arc<CityIndex>,

    started: Instant,
}

impl AppState {
    /// Create application state from already-built parts
    pub fn new(
        config: Config,
        store: Arc<ShipmentStore>,
        tracker: Arc<LiveTracker>,
        cities: Arc<CityIndex>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tracker,
            cities,
            started: Instant::now(),
        }
    }

    /// Open the store and build the backends named in `config`
    pub async fn from_config(config: Config) -> Result<Self> {
        let cities = Arc::new(CityIndex::new());
        let tracker = Arc::new(Tracker::from_config(&config, Arc::clone(&cities))?);
        let store = Arc::new(ShipmentStore::open(config.shipments_path()?).await?);
        Ok(Self::new(config, store, tracker, cities))
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
