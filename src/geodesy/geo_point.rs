use serde::{Deserialize, Serialize};

use crate::math::Vector3;

/// A geographic position on a spherical Earth.
///
/// Longitude and latitude are in radians, height in meters above the mean
/// sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl GeoPoint {
    /// Creates a point from radians and meters.
    #[must_use]
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Creates a point on the sphere surface from degrees.
    #[must_use]
    pub fn from_degrees(longitude: f64, latitude: f64) -> Self {
        Self::new(longitude.to_radians(), latitude.to_radians(), 0.0)
    }

    /// Earth-centered Cartesian position on a sphere of `radius` meters.
    #[must_use]
    pub fn to_ecef(&self, radius: f64) -> Vector3 {
        let r = radius + self.height;
        let cos_lat = self.latitude.cos();
        Vector3::new(
            self.longitude.cos() * r * cos_lat,
            self.longitude.sin() * r * cos_lat,
            self.latitude.sin() * r,
        )
    }

    /// Inverse of [`GeoPoint::to_ecef`].
    ///
    /// The Earth center maps to a point at longitude and latitude zero with a
    /// height of `-radius`.
    #[must_use]
    pub fn from_ecef(position: &Vector3, radius: f64) -> Self {
        let norm = position.norm();
        if norm <= 0.0 {
            return Self::new(0.0, 0.0, -radius);
        }
        let longitude = position.y.atan2(position.x);
        let horizontal = position.x.hypot(position.y);
        let latitude = position.z.atan2(horizontal);
        Self::new(longitude, latitude, norm - radius)
    }
}
