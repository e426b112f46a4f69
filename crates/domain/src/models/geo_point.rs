//! GeoPoint domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ZoneError;

/// An immutable latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting coordinates outside
    /// latitude [-90, 90] / longitude [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ZoneError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Builds a point whose coordinates are already known to be in range.
    pub(crate) const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    /// Maps to `x = longitude`, `y = latitude`, the order `geo` expects.
    fn from(p: GeoPoint) -> Self {
        geo::Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}
