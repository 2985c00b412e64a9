use crate::math::normalize_angle;

use super::GeoPoint;

/// Point halfway along a great-circle arc, with the arc's central angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Midpoint {
    pub point: GeoPoint,
    /// Central angle between the two arc ends, in radians.
    pub theta: f64,
}

/// Spherical geometry between two geographic points.
///
/// Heights are ignored; every result lies on the unit sphere. Coincident and
/// antipodal inputs are not special-cased and may produce NaN.
pub struct GreatCircle;

impl GreatCircle {
    /// Central angle between `a` and `b`, in `[0, pi]`.
    ///
    /// The cosine term is the spherical law of cosines; pairing it with the
    /// sine term through `atan2` keeps the result exactly zero for identical
    /// points. Multiply by the sphere radius to get an arc length.
    #[must_use]
    pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
        let delta_lon = b.longitude - a.longitude;
        let (sin_lat_a, cos_lat_a) = a.latitude.sin_cos();
        let (sin_lat_b, cos_lat_b) = b.latitude.sin_cos();
        let cos_angle = sin_lat_a * sin_lat_b + cos_lat_a * cos_lat_b * delta_lon.cos();
        let sin_angle = (cos_lat_b * delta_lon.sin())
            .hypot(cos_lat_a * sin_lat_b - sin_lat_a * cos_lat_b * delta_lon.cos());
        sin_angle.atan2(cos_angle)
    }

    /// Spherical average of `a` and `b`, together with `distance(a, b)`.
    #[must_use]
    pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> Midpoint {
        let theta = Self::distance(a, b);
        let delta_lon = b.longitude - a.longitude;
        let (sin_lat_a, cos_lat_a) = a.latitude.sin_cos();
        let (sin_lat_b, cos_lat_b) = b.latitude.sin_cos();
        let bx = cos_lat_b * delta_lon.cos();
        let by = cos_lat_b * delta_lon.sin();
        let latitude = (sin_lat_a + sin_lat_b).atan2((cos_lat_a + bx).hypot(by));
        let longitude = a.longitude + by.atan2(cos_lat_a + bx);
        Midpoint {
            point: GeoPoint::new(longitude, latitude, 0.0),
            theta,
        }
    }

    /// The points a quarter and three quarters of the way from `a` to `b`.
    #[must_use]
    pub fn quarter_points(a: &GeoPoint, b: &GeoPoint) -> (GeoPoint, GeoPoint) {
        let middle = Self::midpoint(a, b).point;
        (
            Self::midpoint(a, &middle).point,
            Self::midpoint(&middle, b).point,
        )
    }

    /// Initial heading from `a` towards `b`, in `[0, 2pi)`.
    #[must_use]
    pub fn bearing(a: &GeoPoint, b: &GeoPoint) -> f64 {
        let delta_lon = b.longitude - a.longitude;
        let x = delta_lon.sin() * b.latitude.cos();
        let y = a.latitude.cos() * b.latitude.sin()
            - a.latitude.sin() * b.latitude.cos() * delta_lon.cos();
        normalize_angle(x.atan2(y))
    }

    /// Points at the given `fractions` of the arc from `a` to `b`.
    ///
    /// Heights are interpolated linearly. Returns an empty list when the two
    /// points coincide.
    #[must_use]
    pub fn interpolate(a: &GeoPoint, b: &GeoPoint, fractions: &[f64]) -> Vec<GeoPoint> {
        let theta = Self::distance(a, b);
        if theta <= 0.0 {
            return Vec::new();
        }
        let sin_theta = theta.sin();
        fractions
            .iter()
            .map(|&f| {
                let wa = ((1.0 - f) * theta).sin() / sin_theta;
                let wb = (f * theta).sin() / sin_theta;
                let x = wa * a.latitude.cos() * a.longitude.cos()
                    + wb * b.latitude.cos() * b.longitude.cos();
                let y = wa * a.latitude.cos() * a.longitude.sin()
                    + wb * b.latitude.cos() * b.longitude.sin();
                let z = wa * a.latitude.sin() + wb * b.latitude.sin();
                GeoPoint::new(
                    y.atan2(x),
                    z.atan2(x.hypot(y)),
                    (1.0 - f) * a.height + f * b.height,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn paris() -> GeoPoint {
        GeoPoint::from_degrees(2.35, 48.85)
    }

    fn tokyo() -> GeoPoint {
        GeoPoint::from_degrees(139.69, 35.69)
    }

    #[test]
    fn distance_is_symmetric() {
        let (a, b) = (paris(), tokyo());
        assert_abs_diff_eq!(
            GreatCircle::distance(&a, &b),
            GreatCircle::distance(&b, &a),
            epsilon = 1e-12
        );
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [paris(), tokyo(), GeoPoint::from_degrees(-0.1276, 51.5072)] {
            assert_eq!(GreatCircle::distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn quarter_of_equator() {
        let a = GeoPoint::new(0.0, 0.0, 0.0);
        let b = GeoPoint::new(FRAC_PI_2, 0.0, 0.0);
        assert_abs_diff_eq!(GreatCircle::distance(&a, &b), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn midpoint_is_equidistant() {
        let (a, b) = (paris(), tokyo());
        let mid = GreatCircle::midpoint(&a, &b);
        assert_abs_diff_eq!(mid.theta, GreatCircle::distance(&a, &b), epsilon = 1e-15);
        assert_abs_diff_eq!(
            GreatCircle::distance(&a, &mid.point),
            mid.theta / 2.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            GreatCircle::distance(&mid.point, &b),
            mid.theta / 2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn quarter_points_split_the_arc() {
        let (a, b) = (paris(), tokyo());
        let theta = GreatCircle::distance(&a, &b);
        let (p, q) = GreatCircle::quarter_points(&a, &b);
        assert_abs_diff_eq!(GreatCircle::distance(&a, &p), theta / 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(GreatCircle::distance(&q, &b), theta / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn bearing_due_north_and_east() {
        let origin = GeoPoint::new(0.0, 0.0, 0.0);
        let north = GeoPoint::new(0.0, 0.1, 0.0);
        let east = GeoPoint::new(0.1, 0.0, 0.0);
        let west = GeoPoint::new(-0.1, 0.0, 0.0);
        assert_abs_diff_eq!(GreatCircle::bearing(&origin, &north), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(GreatCircle::bearing(&origin, &east), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(
            GreatCircle::bearing(&origin, &west),
            3.0 * FRAC_PI_2,
            epsilon = 1e-12
        );
        let south = GeoPoint::new(0.0, -0.1, 0.0);
        assert_abs_diff_eq!(GreatCircle::bearing(&origin, &south), PI, epsilon = 1e-12);
    }

    #[test]
    fn interpolate_hits_ends_and_middle() {
        let (a, b) = (paris(), tokyo());
        let points = GreatCircle::interpolate(&a, &b, &[0.0, 0.5, 1.0]);
        assert_eq!(points.len(), 3);
        assert_abs_diff_eq!(GreatCircle::distance(&points[0], &a), 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(GreatCircle::distance(&points[2], &b), 0.0, epsilon = 1e-7);
        let mid = GreatCircle::midpoint(&a, &b).point;
        assert_abs_diff_eq!(GreatCircle::distance(&points[1], &mid), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn interpolate_coincident_points_is_empty() {
        let a = paris();
        assert!(GreatCircle::interpolate(&a, &a, &[0.5]).is_empty());
    }
}
