//! Great-circle distance on a spherical Earth.
//!
//! Only point-to-point distance is supported. The haversine formula below is
//! kept in exactly this shape: radius checks downstream are exact inequalities,
//! so a different Earth radius or an approximation would move boundary results.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(latitude, longitude)` pairs in
/// decimal degrees.
///
/// Inputs are not range-checked; use [`GeoPoint::new`] for that. The result
/// is non-negative for finite input and NaN only if an input is NaN.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = lat2.to_radians() - lat1.to_radians();
    let d_lon = lon2.to_radians() - lon1.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Rounds meters to the 2-decimal precision stored on attendance records.
pub fn round_meters(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

/// Renders meters for display, e.g. `"49.99"`.
pub fn format_distance(meters: f64) -> String {
    format!("{meters:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("coordinates out of range: ({latitude}, {longitude})")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A validated position: latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        // NaN fails both range checks.
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
