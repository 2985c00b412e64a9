use std::f64::consts::TAU;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Global tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// A length in meters.
///
/// Distances handed to [`LocalFrame::project`](crate::geodesy::LocalFrame::project)
/// go through this type so they cannot be confused with kilometers or radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Meters(pub f64);

impl Meters {
    /// Converts kilometers to meters.
    #[must_use]
    pub fn from_km(km: f64) -> Self {
        Self(km * 1000.0)
    }

    /// Returns the length in kilometers.
    #[must_use]
    pub fn km(self) -> f64 {
        self.0 / 1000.0
    }

    /// Returns the central angle this arc length spans on a sphere of `radius`.
    #[must_use]
    pub fn to_central_angle(self, radius: Meters) -> f64 {
        self.0 / radius.0
    }
}

/// Normalizes an angle to `[0, 2pi)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid may round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
