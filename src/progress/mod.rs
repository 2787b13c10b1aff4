//! Automatic progression engine
//!
//! Simulates where a truck would be given the time since pickup. The model:
//! - a handling delay during which progress creeps up to a small cap
//! - a daily driving-hour cap (duty cycle) at a fixed cruising speed
//! - a minimum-speed guarantee so short routes finish in bounded time
//! - paused time excluded from the elapsed clock
//!
//! Everything here is a pure function of the shipment snapshot and `now`.
//! [`tracker`] adds the route and label lookups around it.

pub mod tracker;

use crate::config::ProgressionConfig;
use crate::coord::point::{haversine_miles, interpolate};
use crate::coord::route::point_on_route;
use crate::coord::Coordinates;
use crate::shipment::{millis_to_hours, Shipment, ShipmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use tracker::Tracker;

/// Position produced by the engine before labelling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPosition {
    pub coords: Coordinates,
    /// Fraction of the trip covered, in `[0, 1]`
    pub progress: f64,
    /// Trip distance the progress was measured against
    pub distance_miles: f64,
    /// Progress reached 1; `coords` is exactly the destination
    pub terminal: bool,
}

/// Labelled position handed back to the caller for persisting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub progress: f64,
    /// The refresh changed the stored shipment and it needs saving
    #[serde(skip)]
    pub changed: bool,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Hours the shipment has spent paused as of `now`
///
/// Completed pauses come from `paused_duration`; an open pause is measured
/// from `paused_at`.
pub fn paused_hours(shipment: &Shipment, now: DateTime<Utc>) -> f64 {
    let progress = &shipment.auto_progress;
    let closed = millis_to_hours(progress.paused_duration.max(0));
    let open = match (progress.paused, progress.paused_at) {
        (true, Some(paused_at)) => millis_to_hours((now - paused_at).num_milliseconds().max(0)),
        _ => 0.0,
    };
    closed + open
}

/// Driving hours credited for a window of wall-clock hours
///
/// Each full 24-hour day credits `daily_hours`; the partial day credits at
/// most that.
pub fn driving_hours(window_hours: f64, daily_hours: f64) -> f64 {
    let window = finite_or_zero(window_hours).max(0.0);
    let daily = finite_or_zero(daily_hours).clamp(0.0, 24.0);
    let days = (window / 24.0).floor();
    let remainder = window - days * 24.0;
    days * daily + remainder.min(daily)
}

/// Fraction of a trip of `distance_miles` covered after `effective_hours`
/// of unpaused time
///
/// Always in `[0, 1]`. A non-positive or NaN distance counts as already
/// arrived.
pub fn progress_fraction(
    effective_hours: f64,
    distance_miles: f64,
    params: &ProgressionConfig,
) -> f64 {
    if distance_miles.is_nan() || distance_miles <= 0.0 {
        return 1.0;
    }

    let effective = finite_or_zero(effective_hours).max(0.0);
    let handling = finite_or_zero(params.handling_delay_hours).max(0.0);
    let creep_cap = clamp01(params.handling_creep_cap);

    if effective <= handling {
        if handling == 0.0 {
            return creep_cap;
        }
        return (effective / handling * creep_cap).min(creep_cap);
    }

    let window = effective - handling;

    let speed = finite_or_zero(params.truck_speed_mph);
    let duty_cycle = if speed > 0.0 {
        clamp01(driving_hours(window, params.daily_driving_hours) * speed / distance_miles)
    } else {
        0.0
    };

    let min_rate = finite_or_zero(params.min_miles_per_minute).max(0.0);
    let min_speed = clamp01(window * 60.0 * min_rate / distance_miles);

    // Never report less than the handling window ended on
    creep_cap.max(duty_cycle).max(min_speed)
}

/// Trip distance: cached road distance, else great-circle
pub fn trip_distance(shipment: &Shipment, origin: Coordinates, destination: Coordinates) -> f64 {
    shipment
        .route_distance_miles
        .filter(|d| d.is_finite())
        .unwrap_or_else(|| haversine_miles(origin, destination))
}

/// Compute the simulated position of a shipment at `now`
///
/// Returns `None` (leave the shipment as it is) when progression is disabled,
/// the status is `pending` or `delivered`, an endpoint has no coordinates, the
/// start time is unknown, or `now` is before the start.
pub fn compute_position(
    shipment: &Shipment,
    now: DateTime<Utc>,
    params: &ProgressionConfig,
) -> Option<ComputedPosition> {
    if !shipment.auto_progress.enabled {
        return None;
    }
    if matches!(shipment.status, ShipmentStatus::Pending | ShipmentStatus::Delivered) {
        return None;
    }

    let origin = shipment.origin()?;
    let destination = shipment.destination()?;
    let started_at = shipment.started_at()?;

    let elapsed = millis_to_hours((now - started_at).num_milliseconds());
    if elapsed < 0.0 {
        return None;
    }
    let effective = (elapsed - paused_hours(shipment, now)).max(0.0);

    let distance_miles = trip_distance(shipment, origin, destination);
    let progress = progress_fraction(effective, distance_miles, params);

    if progress >= 1.0 {
        return Some(ComputedPosition {
            coords: destination,
            progress: 1.0,
            distance_miles,
            terminal: true,
        });
    }

    let coords = shipment
        .route_geometry
        .as_deref()
        .and_then(|geometry| point_on_route(geometry, progress))
        .unwrap_or_else(|| interpolate(origin, destination, progress));

    Some(ComputedPosition {
        coords,
        progress,
        distance_miles,
        terminal: false,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shipment::{Address, AutoProgress, CurrentLocation, Party, ShipmentStatus};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap()
    }

    fn endpoint(city: &str, coords: Coordinates) -> Party {
        Party {
            name: city.to_string(),
            address: Address {
                city: city.to_string(),
                lat: Some(coords.lat),
                lng: Some(coords.lng),
                ..Address::default()
            },
            ..Party::default()
        }
    }

    /// In-transit shipment started at `t0()`
    pub(crate) fn shipment_between(origin: Coordinates, destination: Coordinates) -> Shipment {
        Shipment {
            id: "test".to_string(),
            tracking_id: "CW20250601TEST0001".to_string(),
            status: ShipmentStatus::InTransit,
            created_at: Some(t0()),
            updated_at: Some(t0()),
            delivered_at: None,
            sender: endpoint("Douala", origin),
            recipient: endpoint("Maroua", destination),
            package: Default::default(),
            events: Vec::new(),
            estimated_delivery: None,
            current_location: CurrentLocation::at(Some(origin), "Douala"),
            route_geometry: None,
            route_distance_miles: None,
            auto_progress: AutoProgress {
                started_at: Some(t0()),
                ..AutoProgress::default()
            },
            version: 0,
        }
    }

    fn flat_trip(distance_miles: f64) -> Shipment {
        let mut shipment =
            shipment_between(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 10.0));
        shipment.route_distance_miles = Some(distance_miles);
        shipment
    }

    fn duty_cycle_only() -> ProgressionConfig {
        ProgressionConfig {
            min_miles_per_minute: 0.0,
            ..ProgressionConfig::default()
        }
    }

    fn hours(h: f64) -> Duration {
        Duration::milliseconds((h * 3_600_000.0) as i64)
    }

    #[test]
    fn test_driving_hours() {
        assert_eq!(driving_hours(5.0, 11.0), 5.0);
        assert_eq!(driving_hours(20.0, 11.0), 11.0);
        assert_eq!(driving_hours(29.0, 11.0), 16.0);
        assert_eq!(driving_hours(48.0, 11.0), 22.0);
        assert_eq!(driving_hours(-3.0, 11.0), 0.0);
    }

    #[test]
    fn test_handling_delay_creep() {
        let params = ProgressionConfig::default();
        assert_eq!(progress_fraction(0.0, 600.0, &params), 0.0);
        assert_relative_eq!(progress_fraction(1.0, 600.0, &params), 0.0125);
        assert_relative_eq!(progress_fraction(4.0, 600.0, &params), 0.05);
    }

    #[test]
    fn test_no_drop_when_handling_ends() {
        let params = duty_cycle_only();
        let at_end = progress_fraction(4.0, 10_000.0, &params);
        let just_after = progress_fraction(4.01, 10_000.0, &params);
        assert!(just_after >= at_end);
    }

    #[test]
    fn test_degenerate_distance_completes() {
        let params = ProgressionConfig::default();
        assert_eq!(progress_fraction(0.5, 0.0, &params), 1.0);
        assert_eq!(progress_fraction(0.5, -10.0, &params), 1.0);
        assert_eq!(progress_fraction(0.5, f64::NAN, &params), 1.0);
    }

    #[test]
    fn test_boundedness() {
        let stopped = ProgressionConfig {
            truck_speed_mph: 0.0,
            min_miles_per_minute: 0.0,
            ..ProgressionConfig::default()
        };
        let hostile = ProgressionConfig {
            truck_speed_mph: f64::INFINITY,
            daily_driving_hours: f64::NAN,
            handling_delay_hours: -4.0,
            min_miles_per_minute: f64::NAN,
            handling_creep_cap: 7.0,
        };

        for params in [ProgressionConfig::default(), stopped, hostile] {
            for elapsed in [-10.0, 0.0, 0.5, 4.0, 30.0, 1e9, f64::NAN, f64::INFINITY] {
                for distance in [0.0, 1e-9, 1.0, 600.0, 1e12, f64::INFINITY] {
                    let p = progress_fraction(elapsed, distance, &params);
                    assert!((0.0..=1.0).contains(&p), "{} for {} h / {} mi", p, elapsed, distance);
                }
            }
        }
    }

    #[test]
    fn test_zero_speed_uses_minimum_speed_only() {
        let params = ProgressionConfig {
            truck_speed_mph: 0.0,
            ..ProgressionConfig::default()
        };
        // 2 h of driving window at 1 mile/minute over 600 miles
        assert_relative_eq!(progress_fraction(6.0, 600.0, &params), 0.2);
    }

    #[test]
    fn test_minimum_speed_dominates_short_routes() {
        let params = ProgressionConfig::default();
        // 30 min after the handling delay: 30 miles of a 40 mile trip
        assert_relative_eq!(progress_fraction(4.5, 40.0, &params), 0.75);
    }

    #[test]
    fn test_monotonic_over_time() {
        let shipment = flat_trip(1200.0);
        let params = ProgressionConfig::default();

        let mut last = 0.0;
        for step in 0..=(24 * 6 * 4) {
            let now = t0() + Duration::minutes(15 * step);
            let p = compute_position(&shipment, now, &params).unwrap().progress;
            assert!(p >= last, "progress fell from {} to {} at step {}", last, p, step);
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_idempotent() {
        let mut shipment = flat_trip(1200.0);
        shipment.route_geometry = Some(vec![[0.0, 0.0], [0.5, 4.0], [0.0, 10.0]]);
        let params = ProgressionConfig::default();
        let now = t0() + hours(13.3);

        assert_eq!(
            compute_position(&shipment, now, &params),
            compute_position(&shipment, now, &params)
        );
    }

    #[test]
    fn test_handling_scenario_near_origin() {
        let shipment = flat_trip(600.0);
        let params = ProgressionConfig::default();

        let pos = compute_position(&shipment, t0() + hours(1.0), &params).unwrap();
        assert!(pos.progress > 0.0 && pos.progress <= 0.05);
        assert!(!pos.terminal);
        assert_ne!(pos.coords, shipment.origin().unwrap());
        assert!(pos.coords.lng < 1.0);
    }

    #[test]
    fn test_one_day_trip_completes() {
        let shipment = flat_trip(600.0);
        let params = duty_cycle_only();

        // 4 h handling + 11 h of driving covers 605 miles
        let pos = compute_position(&shipment, t0() + hours(15.0), &params).unwrap();
        assert!(pos.terminal);
        assert_eq!(pos.progress, 1.0);
        assert_eq!(pos.coords, shipment.destination().unwrap());

        let before = compute_position(&shipment, t0() + hours(14.0), &params).unwrap();
        assert_relative_eq!(before.progress, 10.0 * 55.0 / 600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_day_trip_rests_overnight() {
        let shipment = flat_trip(1200.0);
        let params = duty_cycle_only();
        let first_day = 11.0 * 55.0 / 1200.0;

        // Driving cap reached 11 h into the window; parked until the next day
        for window in [11.0, 15.0, 23.9] {
            let pos = compute_position(&shipment, t0() + hours(4.0 + window), &params).unwrap();
            assert_relative_eq!(pos.progress, first_day, epsilon = 1e-6);
        }

        // One full day plus 5 h of the second: 16 driving hours
        let pos = compute_position(&shipment, t0() + hours(4.0 + 29.0), &params).unwrap();
        assert_relative_eq!(pos.progress, 16.0 * 55.0 / 1200.0, epsilon = 1e-9);
        assert!(!pos.terminal);

        // Required 21.8 h of driving: done on day two
        let pos = compute_position(&shipment, t0() + hours(4.0 + 24.0 + 11.0), &params).unwrap();
        assert!(pos.terminal);
    }

    #[test]
    fn test_terminal_snap_is_sticky() {
        let shipment = flat_trip(600.0);
        let params = ProgressionConfig::default();
        let destination = shipment.destination().unwrap();

        for days in [1, 2, 10, 365] {
            let pos = compute_position(&shipment, t0() + Duration::days(days), &params).unwrap();
            assert_eq!(pos.coords, destination);
            assert_eq!(pos.progress, 1.0);
        }
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut shipment = flat_trip(1200.0);
        let params = duty_cycle_only();

        let pause_at = t0() + hours(7.0);
        let before = compute_position(&shipment, pause_at, &params).unwrap();

        shipment.status = ShipmentStatus::InTransit;
        shipment.pause(None, pause_at).unwrap();
        for later in [0.5, 3.0, 12.0, 40.0] {
            let during = compute_position(&shipment, pause_at + hours(later), &params).unwrap();
            assert_relative_eq!(during.progress, before.progress, epsilon = 1e-12);
            assert_relative_eq!(during.coords.lng, before.coords.lng, epsilon = 1e-9);
        }

        let resume_at = pause_at + hours(5.0);
        shipment.resume(resume_at).unwrap();
        let resumed = compute_position(&shipment, resume_at, &params).unwrap();
        assert_relative_eq!(resumed.progress, before.progress, epsilon = 1e-9);

        // Paused interval excluded: 2 h after resume equals 9 h unpaused
        let after = compute_position(&shipment, resume_at + hours(2.0), &params).unwrap();
        let unpaused = compute_position(&flat_trip(1200.0), t0() + hours(9.0), &params).unwrap();
        assert_relative_eq!(after.progress, unpaused.progress, epsilon = 1e-9);
        assert!(after.progress > before.progress);
    }

    #[test]
    fn test_paused_whole_window() {
        let mut shipment = flat_trip(1200.0);
        let params = ProgressionConfig::default();

        let pause_at = t0() + Duration::minutes(1);
        let at_pause = compute_position(&shipment, pause_at, &params).unwrap();
        shipment.pause(Some("Customs hold"), pause_at).unwrap();

        let at_resume =
            compute_position(&shipment, pause_at + Duration::hours(48), &params).unwrap();
        assert_eq!(shipment.auto_progress.paused_duration, 0);
        assert_relative_eq!(at_resume.progress, at_pause.progress, epsilon = 1e-12);
    }

    #[test]
    fn test_route_matches_straight_line_on_two_points() {
        let params = ProgressionConfig::default();
        let straight = flat_trip(1200.0);
        let mut routed = flat_trip(1200.0);
        routed.route_geometry = Some(vec![[0.0, 0.0], [0.0, 10.0]]);

        let now = t0() + hours(8.0);
        let a = compute_position(&straight, now, &params).unwrap();
        let b = compute_position(&routed, now, &params).unwrap();
        assert_relative_eq!(a.coords.lat, b.coords.lat, epsilon = 1e-12);
        assert_relative_eq!(a.coords.lng, b.coords.lng, epsilon = 1e-12);
    }

    #[test]
    fn test_follows_route_geometry() {
        let params = duty_cycle_only();
        let mut shipment = flat_trip(1200.0);
        shipment.route_geometry = Some(vec![[0.0, 0.0], [5.0, 5.0], [0.0, 10.0]]);

        // Half way: the polyline's middle vertex, not the straight-line midpoint
        let required = 1200.0 / 55.0;
        let half_driving = required / 2.0;
        let pos = compute_position(&shipment, t0() + hours(4.0 + half_driving), &params).unwrap();
        assert_relative_eq!(pos.progress, 0.5, epsilon = 1e-6);
        assert_relative_eq!(pos.coords.lat, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_short_circuits() {
        let params = ProgressionConfig::default();
        let now = t0() + hours(10.0);

        let mut disabled = flat_trip(600.0);
        disabled.auto_progress.enabled = false;
        assert!(compute_position(&disabled, now, &params).is_none());

        let mut delivered = flat_trip(600.0);
        delivered.status = ShipmentStatus::Delivered;
        assert!(compute_position(&delivered, now, &params).is_none());

        let mut pending = flat_trip(600.0);
        pending.status = ShipmentStatus::Pending;
        assert!(compute_position(&pending, now, &params).is_none());

        let mut no_destination = flat_trip(600.0);
        no_destination.recipient.address.lat = None;
        assert!(compute_position(&no_destination, now, &params).is_none());

        let mut no_start = flat_trip(600.0);
        no_start.auto_progress.started_at = None;
        no_start.created_at = None;
        assert!(compute_position(&no_start, now, &params).is_none());

        // Clock skew
        assert!(compute_position(&flat_trip(600.0), t0() - hours(1.0), &params).is_none());
    }

    #[test]
    fn test_identical_endpoints_complete_immediately() {
        let here = Coordinates::new(4.0511, 9.7679);
        let shipment = shipment_between(here, here);
        let pos = compute_position(&shipment, t0(), &ProgressionConfig::default()).unwrap();
        assert!(pos.terminal);
        assert_eq!(pos.coords, here);
    }

    #[test]
    fn test_haversine_distance_when_no_route() {
        let shipment = shipment_between(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        let pos = compute_position(&shipment, t0(), &ProgressionConfig::default()).unwrap();
        assert_relative_eq!(pos.distance_miles, 69.097, epsilon = 0.01);
    }
}
