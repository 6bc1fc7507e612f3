use serde::{Deserialize, Serialize};

use crate::error::RideError;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A validated latitude/longitude pair in degrees. "No location" is always
/// `Option<GeoCoordinate>` at the owning entity, never a half-filled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lon: f64,
}

impl GeoCoordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, RideError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(RideError::InvalidCoordinate(format!(
                "coordinates must be finite numbers, got ({lat}, {lon})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(RideError::InvalidCoordinate(format!(
                "({lat}, {lon}) is outside the valid lat/lon range"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Re-validates a coordinate that arrived through deserialization.
    pub fn validated(self) -> Result<Self, RideError> {
        Self::new(self.lat, self.lon)
    }
}

pub fn haversine_km(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Rounds to two decimals for presentation values (match distances, prices).
/// Internal comparisons always use full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
