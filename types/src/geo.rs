//! Geographic coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A point on the Earth's surface in decimal degrees (WGS84).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, TypesError> {
        let point = Self { lat, lon };
        point.validate()?;
        Ok(point)
    }

    /// Check that both coordinates are finite and within range.
    ///
    /// Points arriving over the wire are deserialized without validation,
    /// so every protocol entry point calls this before using one.
    pub fn validate(&self) -> Result<(), TypesError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(TypesError::InvalidLocation {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
