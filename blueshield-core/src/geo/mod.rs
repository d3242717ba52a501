//! Great-circle geometry
//!
//! Distances and bearings between WGS84 coordinates on a spherical earth.
//! All zone radii in this crate are expressed in meters, so callers compare
//! [`distance_m`] against them. [`distance_km`] is kept for display.

use serde::{Deserialize, Serialize};

/// Mean earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const METERS_PER_KILOMETER: f64 = 1000.0;

/// Half the circumference, the largest distance two points can be apart
pub const MAX_DISTANCE_KM: f64 = std::f64::consts::PI * EARTH_RADIUS_KM;

pub const KN_TO_MS: f64 = 1852.0 / 3600.0;
pub const MS_TO_KN: f64 = 3600.0 / 1852.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Coordinate { lat, lng }
    }

    /// True when both components are finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(*self, *other)
    }

    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        distance_m(*self, *other)
    }

    /// Move by a small offset in degrees, wrapping longitude and clamping latitude
    pub fn offset(&self, dlat: f64, dlng: f64) -> Coordinate {
        let lat = (self.lat + dlat).clamp(-90.0, 90.0);
        let mut lng = self.lng + dlng;
        if lng > 180.0 {
            lng -= 360.0;
        } else if lng < -180.0 {
            lng += 360.0;
        }
        Coordinate { lat, lng }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Haversine distance in kilometers.
///
/// Identical points yield exactly 0 and antipodal points yield
/// [`MAX_DISTANCE_KM`]. NaN components propagate as NaN.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for antipodal points, which would make sqrt(1 - h) NaN
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Haversine distance in meters
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a, b) * METERS_PER_KILOMETER
}

/// Initial great-circle bearing from `a` to `b` in degrees, normalized to [0, 360)
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    normalize_heading(y.atan2(x).to_degrees())
}

/// Normalize a heading to the [0, 360) range
pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARBOUR: Coordinate = Coordinate::new(13.0827, 80.2707);
    const PROTECTED_AREA: Coordinate = Coordinate::new(37.7749, -122.4194);

    #[test]
    fn test_distance_to_self_is_zero() {
        for c in [HARBOUR, PROTECTED_AREA, Coordinate::new(-89.9, 179.9), Coordinate::new(0.0, 0.0)] {
            assert_eq!(distance_km(c, c), 0.0);
            assert_eq!(distance_m(c, c), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (HARBOUR, PROTECTED_AREA),
            (Coordinate::new(37.7849, -122.4094), PROTECTED_AREA),
            (Coordinate::new(-33.86, 151.21), Coordinate::new(51.5, -0.12)),
        ];
        for (a, b) in pairs {
            assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_known_distance() {
        // One degree of latitude is about 111.19 km on a 6371 km sphere
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_antipodal_is_finite_maximum() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - MAX_DISTANCE_KM).abs() < 1e-6);

        let d = distance_km(Coordinate::new(45.0, 30.0), Coordinate::new(-45.0, -150.0));
        assert!(d.is_finite());
        assert!((d - MAX_DISTANCE_KM).abs() < 1e-3);
    }

    #[test]
    fn test_nan_propagates() {
        let d = distance_km(Coordinate::new(f64::NAN, 0.0), HARBOUR);
        assert!(d.is_nan());
    }

    #[test]
    fn test_bearing_cardinal_points() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((bearing(origin, Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-10.0), 350.0);
        assert_eq!(normalize_heading(0.0), 0.0);
        assert!(normalize_heading(-1e-20) < 360.0);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(HARBOUR.is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_offset_wraps_longitude() {
        let c = Coordinate::new(10.0, 179.9995).offset(0.0, 0.001);
        assert!(c.lng < -179.0);
        let c = Coordinate::new(89.9999, 0.0).offset(0.01, 0.0);
        assert_eq!(c.lat, 90.0);
    }
}
