//! Error types for cargowatch

use thiserror::Error;

/// Main error type for cargowatch operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid shipment: {0}")]
    InvalidShipment(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Shipment not found: {0}")]
    NotFound(String),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Geo error: {0}")]
    Geo(String),
}

/// Result type alias for cargowatch operations
pub type Result<T> = std::result::Result<T, Error>;
