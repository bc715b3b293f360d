//! GeoTile indexer: geohash tiles, bounding boxes, and centroid math.
//!
//! Everything here is pure and deterministic. Distances use an
//! equirectangular approximation, which is accurate enough at the
//! kilometer scale the pulse map works on.

mod bbox;
mod geohash;

pub use bbox::BoundingBox;
pub use geohash::{decode, encode, TileCell};

use serde::{Deserialize, Serialize};

use crate::constants::METERS_PER_DEGREE;
use crate::errors::{PulseError, PulseResult};

/// Geohash tile identifier.
pub type TileId = String;

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    pub fn new(lat: f64, lng: f64) -> PulseResult<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(PulseError::invalid(format!(
                "coordinates must be finite, got ({lat}, {lng})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PulseError::invalid(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(PulseError::invalid(format!(
                "longitude {lng} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Approximate ground distance in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let mean_lat = ((self.lat + other.lat) / 2.0).to_radians();
        let dy = (other.lat - self.lat) * METERS_PER_DEGREE;
        let dx = (other.lng - self.lng) * METERS_PER_DEGREE * mean_lat.cos();
        (dx * dx + dy * dy).sqrt()
    }
}

/// Arithmetic mean of a set of points. `None` when the set is empty.
pub fn centroid<I>(points: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = Coordinate>,
{
    let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat;
        lng += p.lng;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(Coordinate {
        lat: lat / n as f64,
        lng: lng / n as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn centroid_of_points() {
        let c = centroid([
            Coordinate { lat: 1.0, lng: 2.0 },
            Coordinate { lat: 3.0, lng: 4.0 },
        ])
        .unwrap();
        assert!((c.lat - 2.0).abs() < 1e-12);
        assert!((c.lng - 3.0).abs() < 1e-12);
        assert!(centroid(std::iter::empty()).is_none());
    }

    #[test]
    fn distance_is_roughly_meters() {
        let a = Coordinate::new(40.0, -74.0).unwrap();
        let b = Coordinate::new(40.001, -74.0).unwrap();
        let d = a.distance_m(&b);
        assert!((d - 111.32).abs() < 0.5, "got {d}");
    }
}
