use serde::{Deserialize, Serialize};

use super::{BoundingBox, Coordinate, TileId};
use crate::constants::MAX_TILE_PRECISION;
use crate::errors::{PulseError, PulseResult};

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// A decoded tile: its center and extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileCell {
    pub center: Coordinate,
    pub bounds: BoundingBox,
}

/// Encode a coordinate into a geohash of `precision` characters.
pub fn encode(coord: Coordinate, precision: usize) -> PulseResult<TileId> {
    if precision == 0 || precision > MAX_TILE_PRECISION {
        return Err(PulseError::invalid(format!(
            "tile precision {precision} outside 1..={MAX_TILE_PRECISION}"
        )));
    }
    let coord = Coordinate::new(coord.lat, coord.lng)?;

    let (mut lat_lo, mut lat_hi) = (-90.0_f64, 90.0_f64);
    let (mut lng_lo, mut lng_hi) = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let mut bits = 0u8;
    let mut idx = 0usize;

    while hash.len() < precision {
        if even {
            let mid = (lng_lo + lng_hi) / 2.0;
            if coord.lng >= mid {
                idx = (idx << 1) | 1;
                lng_lo = mid;
            } else {
                idx <<= 1;
                lng_hi = mid;
            }
        } else {
            let mid = (lat_lo + lat_hi) / 2.0;
            if coord.lat >= mid {
                idx = (idx << 1) | 1;
                lat_lo = mid;
            } else {
                idx <<= 1;
                lat_hi = mid;
            }
        }
        even = !even;
        bits += 1;
        if bits == 5 {
            hash.push(BASE32[idx] as char);
            bits = 0;
            idx = 0;
        }
    }
    Ok(hash)
}

/// Decode a geohash into its center point and bounding box.
pub fn decode(tile: &str) -> PulseResult<TileCell> {
    if tile.is_empty() || tile.len() > MAX_TILE_PRECISION {
        return Err(PulseError::invalid(format!(
            "tile id '{tile}' has invalid length"
        )));
    }

    let (mut lat_lo, mut lat_hi) = (-90.0_f64, 90.0_f64);
    let (mut lng_lo, mut lng_hi) = (-180.0_f64, 180.0_f64);
    let mut even = true;

    for ch in tile.bytes() {
        let ch = ch.to_ascii_lowercase();
        let idx = BASE32
            .iter()
            .position(|&b| b == ch)
            .ok_or_else(|| PulseError::invalid(format!("tile id '{tile}' is not a geohash")))?;
        for shift in (0..5).rev() {
            let bit = (idx >> shift) & 1;
            if even {
                let mid = (lng_lo + lng_hi) / 2.0;
                if bit == 1 {
                    lng_lo = mid;
                } else {
                    lng_hi = mid;
                }
            } else {
                let mid = (lat_lo + lat_hi) / 2.0;
                if bit == 1 {
                    lat_lo = mid;
                } else {
                    lat_hi = mid;
                }
            }
            even = !even;
        }
    }

    Ok(TileCell {
        center: Coordinate {
            lat: (lat_lo + lat_hi) / 2.0,
            lng: (lng_lo + lng_hi) / 2.0,
        },
        bounds: BoundingBox {
            min_lat: lat_lo,
            min_lng: lng_lo,
            max_lat: lat_hi,
            max_lng: lng_hi,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn encodes_known_geohashes() {
        assert_eq!(encode(coord(57.64911, 10.40744), 11).unwrap(), "u4pruydqqvj");
        assert_eq!(encode(coord(42.605, -5.603), 5).unwrap(), "ezs42");
    }

    #[test]
    fn coarse_is_prefix_of_fine() {
        let c = coord(40.7128, -74.0060);
        let coarse = encode(c, 6).unwrap();
        let fine = encode(c, 7).unwrap();
        assert!(fine.starts_with(&coarse));
    }

    #[test]
    fn decode_contains_original_point() {
        let c = coord(-33.8688, 151.2093);
        let tile = encode(c, 6).unwrap();
        let cell = decode(&tile).unwrap();
        assert!(cell.bounds.contains(&c));
        assert_eq!(encode(cell.center, 6).unwrap(), tile);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(encode(coord(0.0, 0.0), 0).is_err());
        assert!(encode(coord(0.0, 0.0), 13).is_err());
        assert!(decode("").is_err());
        assert!(decode("abc!").is_err());
        // 'a' is not in the geohash alphabet.
        assert!(decode("a").is_err());
    }

    #[test]
    fn extreme_corners_encode() {
        assert!(encode(coord(90.0, 180.0), 6).is_ok());
        assert!(encode(coord(-90.0, -180.0), 6).is_ok());
    }
}
