//! Geodesy helpers.
//!
//! Coordinates are WGS84 degrees. Distances use the haversine great-circle
//! formula on a sphere with a fixed radius.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earth radius used by every distance computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Error returned when a coordinate is outside the valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is outside -90..=90")]
    Latitude(f64),

    #[error("Longitude {0} is outside -180..=180")]
    Longitude(f64),
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate, rejecting out-of-range or non-finite values.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(*self, *other)
    }
}

/// Haversine distance between two coordinates, in meters.
///
/// Symmetric and zero for identical inputs.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against h drifting above 1.0 for antipodal points.
    EARTH_RADIUS_METERS * 2.0 * h.sqrt().min(1.0).asin()
}
