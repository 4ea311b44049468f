//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Mean Earth radius used by the spherical approximation (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use ev_planner::geo::GeoPoint;
///
/// let delhi = GeoPoint::new(28.70, 77.10);
/// let bangalore = GeoPoint::new(12.97, 77.59);
/// let km = delhi.haversine_km(&bangalore);
/// assert!((km - 1750.0).abs() < 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both coordinates are finite and inside their valid range.
    ///
    /// `index` is only used to label the error.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` naming the offending coordinate.
    pub fn validate(&self, index: usize) -> Result<(), InputError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(InputError::NonFiniteCoordinate { index });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InputError::LatitudeOutOfRange {
                index,
                value: self.latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InputError::LongitudeOutOfRange {
                index,
                value: self.longitude,
            });
        }
        Ok(())
    }

    /// Great-circle distance to `other` in kilometres (haversine formula).
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    /// Position on the unit sphere, used by the R-tree index.
    pub(crate) fn unit_vector(&self) -> [f64; 3] {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

/// Validates every point of a set.
///
/// # Errors
///
/// Returns the error for the first invalid point.
pub fn validate_points(points: &[GeoPoint]) -> Result<(), InputError> {
    points
        .iter()
        .enumerate()
        .try_for_each(|(i, p)| p.validate(i))
}
