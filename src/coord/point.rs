//! Point-to-point geometry
//!
//! Great-circle distance plus the straight-line fallback used when no road
//! polyline is known.

use crate::constants::geo::EARTH_RADIUS_MILES;
use crate::coord::Coordinates;

/// Calculate the distance between two points in miles (Haversine formula)
///
/// # Arguments
/// * `p1` - First point
/// * `p2` - Second point
///
/// # Returns
/// Distance in miles
pub fn haversine_miles(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lng = (p2.lng - p1.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Linear interpolation between two coordinates
///
/// Treats latitude and longitude as a flat plane. `fraction` is clamped to
/// `[0, 1]`.
pub fn interpolate(from: Coordinates, to: Coordinates, fraction: f64) -> Coordinates {
    let t = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    Coordinates::new(
        from.lat + (to.lat - from.lat) * t,
        from.lng + (to.lng - from.lng) * t,
    )
}
