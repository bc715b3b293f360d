use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::constants::KM_PER_DEGREE;
use crate::errors::{PulseError, PulseResult};

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> PulseResult<Self> {
        Coordinate::new(min_lat, min_lng)?;
        Coordinate::new(max_lat, max_lng)?;
        if min_lat > max_lat || min_lng > max_lng {
            return Err(PulseError::invalid(format!(
                "bounding box minimum ({min_lat}, {min_lng}) exceeds maximum ({max_lat}, {max_lng})"
            )));
        }
        Ok(Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        })
    }

    /// Box of roughly `radius_km` around `center`, clipped to valid ranges.
    pub fn around(center: Coordinate, radius_km: f64) -> PulseResult<Self> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(PulseError::invalid(format!(
                "radius {radius_km} km must be a non-negative number"
            )));
        }
        let dlat = radius_km / KM_PER_DEGREE;
        // Longitude degrees shrink toward the poles; keep the divisor away from zero.
        let cos_lat = center.lat.to_radians().cos().max(0.01);
        let dlng = radius_km / (KM_PER_DEGREE * cos_lat);
        Ok(Self {
            min_lat: (center.lat - dlat).max(-90.0),
            min_lng: (center.lng - dlng).max(-180.0),
            max_lat: (center.lat + dlat).min(90.0),
            max_lng: (center.lng + dlng).min(180.0),
        })
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lng: (self.min_lng + self.max_lng) / 2.0,
        }
    }
}
