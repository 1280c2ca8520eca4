use geo::{point, HaversineDistance};

use crate::models::{Coordinates, Profile};

const METERS_PER_MILE: f64 = 1609.344;

/// Calculate the Haversine distance between two points in miles
///
/// # Arguments
/// * `from` - First point, degrees
/// * `to` - Second point, degrees
#[inline]
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let a = point!(x: from.longitude, y: from.latitude);
    let b = point!(x: to.longitude, y: to.latitude);

    a.haversine_distance(&b) / METERS_PER_MILE
}

/// Distance between two profiles, if both shared their coordinates.
/// Rounded to one decimal.
pub fn profile_distance_miles(a: &Profile, b: &Profile) -> Option<f64> {
    let from = a.location.coordinates?;
    let to = b.location.coordinates?;

    Some((haversine_miles(from, to) * 10.0).round() / 10.0)
}
