//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::coord::Coordinates;
use crate::error::Error;
use crate::format::TrackingReport;
use crate::server::state::AppState;
use crate::shipment::lifecycle::NewShipment;
use crate::shipment::{Shipment, ShipmentStatus};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(info_handler))
        .route("/api/status", get(status_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/shipments", get(list_handler).post(create_handler))
        .route("/api/shipments/recent", get(recent_handler))
        .route("/api/shipments/:tracking_id", get(track_handler))
        .route("/api/shipments/:tracking_id/status", put(status_update_handler))
        .route("/api/shipments/:tracking_id/pause", put(pause_handler))
        .route("/api/shipments/:tracking_id/location", put(location_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Error::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Error::InvalidShipment(_) => (StatusCode::BAD_REQUEST, "INVALID_SHIPMENT"),
            Error::InvalidCoordinates(_) => (StatusCode::BAD_REQUEST, "INVALID_COORDINATES"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
            status,
        }
    }
}

/// Recompute a shipment's position and save it if it moved
///
/// If someone else saved the shipment in between, their version wins and is
/// returned instead. Progress is reported either way.
async fn refresh_and_commit(state: &AppState, mut shipment: Shipment) -> TrackingReport {
    let now = Utc::now();
    let Some(update) = state.tracker.refresh_position(&mut shipment, now).await else {
        return TrackingReport::new(shipment, None, now);
    };
    if !update.changed {
        return TrackingReport::new(shipment, Some(update.progress), now);
    }

    let fallback = shipment.clone();
    let shipment = match state.store.commit(shipment).await {
        Ok(saved) => saved,
        Err(Error::Conflict(_)) => state
            .store
            .get(&fallback.tracking_id)
            .await
            .unwrap_or(fallback),
        Err(e) => {
            warn!("{}: position not saved: {}", fallback.tracking_id, e);
            state.store.get(&fallback.tracking_id).await.unwrap_or(fallback)
        }
    };
    TrackingReport::new(shipment, Some(update.progress), now)
}

/// API info response
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
}

/// API information
///
/// GET /api
async fn info_handler() -> Json<InfoResponse> {
    let endpoints = [
        ("GET /api", "API information"),
        ("GET /api/status", "Server status"),
        ("GET /api/stats", "Global statistics"),
        ("GET /api/shipments", "List all shipments"),
        ("POST /api/shipments", "Create a shipment"),
        ("GET /api/shipments/recent", "Most recently created shipments"),
        ("GET /api/shipments/:trackingId", "Shipment details with a fresh position"),
        ("PUT /api/shipments/:trackingId/status", "Update shipment status"),
        ("PUT /api/shipments/:trackingId/pause", "Pause or resume automatic progression"),
        ("PUT /api/shipments/:trackingId/location", "Set the location by hand"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(InfoResponse {
        name: "CargoWatch API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Shipment tracking with simulated road progression".to_string(),
        endpoints,
    })
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Number of stored shipments
    pub shipments: usize,
    /// Whether the periodic sweep is enabled
    pub sweep_enabled: bool,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let sweep_enabled = state.config.read().await.sweep.enabled;
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        shipments: state.store.len().await,
        sweep_enabled,
        uptime_secs: state.uptime_secs(),
    })
}

/// Global statistics
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub active_shipments: usize,
    pub delivered_today: usize,
    pub countries_served: usize,
    pub total_shipments: usize,
    pub pending: usize,
    pub delivered: usize,
    pub in_transit: usize,
}

/// GET /api/stats
async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let shipments = state.store.list().await;
    let today = Utc::now().date_naive();

    let mut stats = StatsResponse {
        total_shipments: shipments.len(),
        ..StatsResponse::default()
    };
    let mut countries = HashSet::new();

    for s in &shipments {
        match s.status {
            ShipmentStatus::Pending => stats.pending += 1,
            ShipmentStatus::Delivered => stats.delivered += 1,
            ShipmentStatus::PickedUp
            | ShipmentStatus::InTransit
            | ShipmentStatus::OutForDelivery => stats.in_transit += 1,
            ShipmentStatus::Exception => {}
        }
        if s.status != ShipmentStatus::Delivered {
            stats.active_shipments += 1;
        }
        if s.delivered_at.is_some_and(|d| d.date_naive() == today) {
            stats.delivered_today += 1;
        }
        for country in [&s.sender.address.country, &s.recipient.address.country] {
            if !country.trim().is_empty() {
                countries.insert(country.trim().to_uppercase());
            }
        }
    }
    stats.countries_served = countries.len();

    Json(stats)
}

/// GET /api/shipments
async fn list_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Shipment>> {
    Json(state.store.list().await)
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Most recently created shipments, newest first
///
/// GET /api/shipments/recent?limit=3
async fn recent_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<Shipment>> {
    let mut shipments = state.store.list().await;
    // Stored in insertion order; reversing first keeps ties newest-first
    shipments.reverse();
    shipments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    shipments.truncate(query.limit.unwrap_or(3));
    Json(shipments)
}

/// POST /api/shipments
async fn create_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewShipment>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let shipment = Shipment::new(req, state.cities.as_ref(), Utc::now())?;
    let saved = state.store.insert(shipment).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Shipment details, with the position refreshed first
///
/// GET /api/shipments/:tracking_id
async fn track_handler(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> Result<Json<TrackingReport>, ApiError> {
    let shipment = state
        .store
        .get(&tracking_id)
        .await
        .ok_or(Error::NotFound(tracking_id))?;
    Ok(Json(refresh_and_commit(&state, shipment).await))
}

/// Status update request body
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// PUT /api/shipments/:tracking_id/status
async fn status_update_handler(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<TrackingReport>, ApiError> {
    let cities = Arc::clone(&state.cities);
    let updated = state
        .store
        .update(&tracking_id, |s| {
            s.apply_status(
                req.status,
                req.location.as_deref(),
                req.description.as_deref(),
                cities.as_ref(),
                Utc::now(),
            )
        })
        .await?;
    Ok(Json(refresh_and_commit(&state, updated).await))
}

/// Pause request body
#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub pause: bool,
    pub reason: Option<String>,
}

/// PUT /api/shipments/:tracking_id/pause
async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
    Json(req): Json<PauseRequest>,
) -> Result<Json<TrackingReport>, ApiError> {
    let updated = state
        .store
        .update(&tracking_id, |s| {
            if req.pause {
                s.pause(req.reason.as_deref(), Utc::now())
            } else {
                s.resume(Utc::now())
            }
        })
        .await?;
    Ok(Json(refresh_and_commit(&state, updated).await))
}

/// Manual location request body
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub city: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// PUT /api/shipments/:tracking_id/location
async fn location_handler(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<Shipment>, ApiError> {
    let coords = match (req.lat, req.lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => state.cities.resolve(&req.city),
    };
    let updated = state
        .store
        .update(&tracking_id, |s| s.set_manual_location(&req.city, coords, Utc::now()))
        .await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn create_test_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.routing.backend = "none".to_string();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        let state = Arc::new(AppState::from_config(config).await.unwrap());
        (create_router(state), dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn new_shipment(from: &str, to: &str) -> Value {
        json!({
            "sender": {"name": "Ngono Awa", "address": {"city": from}},
            "recipient": {"name": "Bello Issa", "address": {"city": to}},
            "package": {"type": "parcel", "weight": 2.5}
        })
    }

    async fn create(app: &Router, from: &str, to: &str) -> String {
        let body = new_shipment(from, to);
        let (status, body) = send(app, "POST", "/api/shipments", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["trackingId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_info_endpoint() {
        let (app, _dir) = create_test_app().await;
        let (status, body) = send(&app, "GET", "/api", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "CargoWatch API");
        assert!(body["endpoints"].get("GET /api/stats").is_some());
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (app, _dir) = create_test_app().await;
        let (status, body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["running"], true);
        assert_eq!(body["shipments"], 0);
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;
        assert!(id.starts_with("CW"));

        let (status, body) = send(&app, "GET", "/api/shipments", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["status"], "pending");
        assert_eq!(list[0]["sender"]["address"]["lat"], 4.0511);
        assert_eq!(list[0]["package"]["type"], "parcel");
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let (app, _dir) = create_test_app().await;
        let body = new_shipment("Douala", "");
        let (status, body) = send(&app, "POST", "/api/shipments", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_SHIPMENT");
    }

    #[tokio::test]
    async fn test_track_unknown() {
        let (app, _dir) = create_test_app().await;
        let (status, body) = send(&app, "GET", "/api/shipments/CW00000000NOPE0000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_pickup_then_track() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/shipments/{}/status", id),
            Some(json!({"status": "picked_up"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shipment"]["status"], "picked_up");
        assert!(body["shipment"]["autoProgress"]["startedAt"].is_string());

        // Lowercase IDs resolve too; refreshing records lastUpdate
        let uri = format!("/api/shipments/{}", id.to_lowercase());
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["shipment"]["autoProgress"]["lastUpdate"].is_string());
        let progress = body["progress"].as_f64().unwrap();
        assert!((0.0..=0.05).contains(&progress));
        assert_eq!(body["shipment"]["currentLocation"]["city"], "Douala, Littoral");
    }

    #[tokio::test]
    async fn test_pending_track_has_no_progress() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;

        let (status, body) = send(&app, "GET", &format!("/api/shipments/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("progress").is_none());
        assert_eq!(body["shipment"]["version"], 1);
    }

    #[tokio::test]
    async fn test_pause_resume() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Kribi").await;
        let uri = format!("/api/shipments/{}/pause", id);

        let pause = json!({"pause": true, "reason": "Customs"});
        let (status, body) = send(&app, "PUT", &uri, Some(pause)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shipment"]["autoProgress"]["paused"], true);
        assert_eq!(body["shipment"]["autoProgress"]["pauseReason"], "Customs");

        let (status, body) = send(&app, "PUT", &uri, Some(json!({"pause": true}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_TRANSITION");

        let (status, body) = send(&app, "PUT", &uri, Some(json!({"pause": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shipment"]["autoProgress"]["paused"], false);
    }

    #[tokio::test]
    async fn test_manual_location() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;
        send(
            &app,
            "PUT",
            &format!("/api/shipments/{}/status", id),
            Some(json!({"status": "in_transit"})),
        )
        .await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/shipments/{}/location", id),
            Some(json!({"city": "Edéa"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentLocation"]["city"], "Edéa");
        assert_eq!(body["currentLocation"]["manual"], true);
        assert_eq!(body["currentLocation"]["lat"], 3.8);
        assert_eq!(body["autoProgress"]["paused"], true);

        // Tracking does not move a manually placed shipment
        let (_, body) = send(&app, "GET", &format!("/api/shipments/{}", id), None).await;
        assert_eq!(body["shipment"]["currentLocation"]["city"], "Edéa");
    }

    #[tokio::test]
    async fn test_deliver() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/shipments/{}/status", id),
            Some(json!({"status": "delivered"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shipment"]["currentLocation"]["lat"], 3.848);
        assert_eq!(body["shipment"]["currentLocation"]["city"], "Yaoundé");
        assert!(body["shipment"]["deliveredAt"].is_string());

        let (_, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["delivered"], 1);
        assert_eq!(stats["deliveredToday"], 1);
        assert_eq!(stats["activeShipments"], 0);
    }

    #[tokio::test]
    async fn test_stats_and_recent() {
        let (app, _dir) = create_test_app().await;
        create(&app, "Douala", "Yaoundé").await;
        create(&app, "Bamenda", "Garoua").await;
        let newest = create(&app, "Kribi", "Bertoua").await;

        let (status, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        let stats: StatsResponse = serde_json::from_value(stats).unwrap();
        assert_eq!(
            stats,
            StatsResponse {
                active_shipments: 3,
                delivered_today: 0,
                countries_served: 1,
                total_shipments: 3,
                pending: 3,
                delivered: 0,
                in_transit: 0,
            }
        );

        let (_, recent) = send(&app, "GET", "/api/shipments/recent?limit=1", None).await;
        let recent = recent.as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0]["trackingId"], newest.as_str());
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let (app, _dir) = create_test_app().await;
        let id = create(&app, "Douala", "Yaoundé").await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/shipments/{}/status", id),
            Some(json!({"status": "teleported"})),
        )
        .await;
        assert!(status.is_client_error());
    }
}
