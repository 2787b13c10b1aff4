//! cargowatch: shipment tracking with simulated road progression
//!
//! A library and CLI tool that tracks parcels between cities and moves them
//! along their road route as a pure function of elapsed time, following a
//! simple trucking model (handling delay, cruising speed, daily driving cap).
//!
//! ## Features
//!
//! - Deterministic progression engine with pause accounting
//! - OSRM road routes with straight-line fallback
//! - Static city table or Nominatim for position labels
//! - JSON-file store with optimistic concurrency
//! - Periodic background sweep
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use cargowatch::config::ProgressionConfig;
//! use cargowatch::progress::progress_fraction;
//!
//! let params = ProgressionConfig::default();
//! // Two hours after pickup the truck is still being loaded
//! let early = progress_fraction(2.0, 150.0, &params);
//! assert!(early < params.handling_creep_cap);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod format;
pub mod geo;
pub mod progress;
pub mod server;
pub mod shipment;
pub mod store;
pub mod sweep;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinates;
pub use error::{Error, Result};
pub use progress::Tracker;
pub use shipment::{Shipment, ShipmentStatus};
pub use store::ShipmentStore;
