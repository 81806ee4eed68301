//! Geographic locations
//!
//! Observations and deadhead journey starts are expressed as WGS84
//! latitude/longitude pairs. The pair is stored as a typed two-vector so it
//! cannot be confused with projected (metric) offsets.

use core::fmt;

use nalgebra::Vector2;

/// Mean Earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    inner: Vector2<f64>,
}

impl Location {
    /// Creates a location from latitude and longitude in degrees.
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            inner: Vector2::new(lat, lon),
        }
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.inner.x
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.inner.y
    }

    /// Returns a reference to the underlying nalgebra vector `[lat, lon]`.
    #[inline]
    pub fn as_vector(&self) -> &Vector2<f64> {
        &self.inner
    }

    /// Great-circle (haversine) distance to `other`, in meters.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.lat().to_radians();
        let lat2 = other.lat().to_radians();
        let delta = (other.inner - self.inner).map(f64::to_radians);

        let a = (delta.x / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta.y / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }

    /// Returns the location displaced by `east` and `north` meters.
    ///
    /// Uses a local flat-earth approximation, adequate for the few hundred
    /// meters a vehicle moves between reports.
    pub fn offset_meters(&self, east: f64, north: f64) -> Location {
        let d_lat = (north / EARTH_RADIUS_M).to_degrees();
        let d_lon = (east / (EARTH_RADIUS_M * self.lat().to_radians().cos())).to_degrees();
        Location {
            inner: self.inner + Vector2::new(d_lat, d_lon),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat(), self.lon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let loc = Location::new(40.7128, -74.0060);
        assert!(loc.distance_to(&loc).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        // One degree of arc on the mean sphere
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((a.distance_to(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_offset_round_trips_through_distance() {
        let origin = Location::new(40.75, -73.99);
        let moved = origin.offset_meters(300.0, 400.0);
        let d = origin.distance_to(&moved);
        assert!((d - 500.0).abs() < 1.0, "distance was {d}");
    }
}
