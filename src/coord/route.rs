//! Position along a route polyline

use crate::coord::Coordinates;

/// Map a progress fraction onto an ordered polyline
///
/// `exact = progress * (len - 1)`; the result is interpolated between the two
/// bracketing points. Progress is clamped to `[0, 1]`. Returns `None` for an
/// empty polyline.
pub fn point_on_route(geometry: &[[f64; 2]], progress: f64) -> Option<Coordinates> {
    let last = geometry.len().checked_sub(1)?;
    let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };

    let exact = progress * last as f64;
    let index = exact.floor() as usize;
    if index >= last {
        return Some(Coordinates::from_pair(geometry[last]));
    }

    let fraction = exact - index as f64;
    let [lat1, lng1] = geometry[index];
    let [lat2, lng2] = geometry[index + 1];

    Some(Coordinates::new(
        lat1 + (lat2 - lat1) * fraction,
        lng1 + (lng2 - lng1) * fraction,
    ))
}
