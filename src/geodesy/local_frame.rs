use crate::math::{normalize_angle, Matrix3, Meters, Vector3, EARTH_RADIUS_METERS};

use super::GeoPoint;

/// A North-East-Down tangent frame anchored at a reference point.
///
/// Cones hang below the Earth surface, so "down" is the positive third axis
/// and elevation angles handed to [`LocalFrame::project`] point into the
/// sphere. The rotation is computed once and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFrame {
    reference: GeoPoint,
    radius: Meters,
    origin: Vector3,
    /// Rows are the north, east and down unit vectors in Earth-centered axes.
    ecef_to_ned: Matrix3,
}

impl LocalFrame {
    /// Builds the frame on the mean Earth sphere.
    #[must_use]
    pub fn new(reference: GeoPoint) -> Self {
        Self::with_radius(reference, Meters(EARTH_RADIUS_METERS))
    }

    /// Builds the frame on a sphere of the given radius.
    #[must_use]
    pub fn with_radius(reference: GeoPoint, radius: Meters) -> Self {
        let (sin_lon, cos_lon) = reference.longitude.sin_cos();
        let (sin_lat, cos_lat) = reference.latitude.sin_cos();
        #[rustfmt::skip]
        let ecef_to_ned = Matrix3::new(
            -cos_lon * sin_lat, -sin_lon * sin_lat,  cos_lat,
            -sin_lon,            cos_lon,            0.0,
            -cos_lon * cos_lat, -sin_lon * cos_lat, -sin_lat,
        );
        Self {
            reference,
            radius,
            origin: reference.to_ecef(radius.0),
            ecef_to_ned,
        }
    }

    /// The point the frame is anchored at.
    #[must_use]
    pub fn reference(&self) -> &GeoPoint {
        &self.reference
    }

    /// Radius of the sphere the frame lives on.
    #[must_use]
    pub fn radius(&self) -> Meters {
        self.radius
    }

    /// The rotation from Earth-centered axes to north/east/down.
    #[must_use]
    pub fn rotation(&self) -> &Matrix3 {
        &self.ecef_to_ned
    }

    /// Local `(north, east, down)` coordinates of `point`, in meters.
    #[must_use]
    pub fn to_local(&self, point: &GeoPoint) -> Vector3 {
        self.ecef_to_ned * (point.to_ecef(self.radius.0) - self.origin)
    }

    /// Inverse of [`LocalFrame::to_local`].
    #[must_use]
    pub fn to_geographic(&self, local: &Vector3) -> GeoPoint {
        let ecef = self.ecef_to_ned.transpose() * local + self.origin;
        GeoPoint::from_ecef(&ecef, self.radius.0)
    }

    /// Clock bearing of `point` seen from the reference, in `[0, 2pi)`.
    #[must_use]
    pub fn bearing_to(&self, point: &GeoPoint) -> f64 {
        let local = self.to_local(point);
        normalize_angle(local.y.atan2(local.x))
    }

    /// Unit direction for a clock bearing and an elevation below the horizon.
    #[must_use]
    pub fn direction(bearing: f64, elevation: f64) -> Vector3 {
        let (sin_el, cos_el) = elevation.sin_cos();
        let (sin_b, cos_b) = bearing.sin_cos();
        Vector3::new(cos_el * cos_b, cos_el * sin_b, sin_el)
    }

    /// Geographic point reached by travelling `distance` from the reference
    /// along `bearing`, tilted `elevation` radians below the local horizon.
    #[must_use]
    pub fn project(&self, bearing: f64, elevation: f64, distance: Meters) -> GeoPoint {
        self.to_geographic(&(Self::direction(bearing, elevation) * distance.0))
    }
}
