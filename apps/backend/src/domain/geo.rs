//! Coordinates and geodesic distance on the WGS-84 ellipsoid.

use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject non-finite values and anything outside [-90, 90] x [-180, 180].
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(DomainError::validation(
                ValidationKind::InvalidCoordinate,
                format!("lat must be within [-90, 90], got {}", self.lat),
            ));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(DomainError::validation(
                ValidationKind::InvalidCoordinate,
                format!("lon must be within [-180, 180], got {}", self.lon),
            ));
        }
        Ok(())
    }

    /// Geodesic distance in kilometers (Karney's inverse solution).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        // geo points are (x, y) = (lon, lat)
        let a = Point::new(self.lon, self.lat);
        let b = Point::new(other.lon, other.lat);
        a.geodesic_distance(&b) / 1000.0
    }

    /// Shift by raw degree offsets. Longitude is not wrapped.
    pub fn offset(&self, dlat: f64, dlon: f64) -> GeoPoint {
        GeoPoint::new(self.lat + dlat, self.lon + dlon)
    }
}
