//! Privacy blur: move a point to a random location inside a disc.

use rand::Rng;

use pulse_core::constants::METERS_PER_DEGREE;
use pulse_core::geo::Coordinate;

/// Return a point drawn uniformly from the disc of `radius_m` around `coord`.
///
/// The draw is area-uniform (`r = R·√u`) so blurred points do not pile up
/// near the true location. The result is clamped to valid lat/lng ranges.
pub fn blur_with<R: Rng + ?Sized>(coord: Coordinate, radius_m: f64, rng: &mut R) -> Coordinate {
    if radius_m <= 0.0 {
        return coord;
    }
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let distance_m = radius_m * rng.gen::<f64>().sqrt();

    let dlat = distance_m * angle.cos() / METERS_PER_DEGREE;
    let cos_lat = coord.lat.to_radians().cos().max(0.01);
    let dlng = distance_m * angle.sin() / (METERS_PER_DEGREE * cos_lat);

    Coordinate {
        lat: (coord.lat + dlat).clamp(-90.0, 90.0),
        lng: (coord.lng + dlng).clamp(-180.0, 180.0),
    }
}

/// Blur with the thread-local RNG.
pub fn blur(coord: Coordinate, radius_m: f64) -> Coordinate {
    blur_with(coord, radius_m, &mut rand::thread_rng())
}
