use std::collections::BTreeMap;

use crate::geodesy::{GeoPoint, GreatCircle, LocalFrame};
use crate::math::Meters;

use super::dataset::EdgeRow;

/// Great-circle construction points shared by every edge between two cities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairGeometry {
    pub middle: GeoPoint,
    /// Quarter point on the side of the first city.
    pub p: GeoPoint,
    /// Quarter point on the side of the second city.
    pub q: GeoPoint,
    /// Central angle between the two cities.
    pub theta: f64,
    /// Bearing of the second city seen from the first one.
    pub bearing: f64,
    /// Bearing of the first city seen from the second one.
    pub reverse_bearing: f64,
}

impl PairGeometry {
    /// Geometry from the city anchoring `from` to the one anchoring `to`.
    #[must_use]
    pub fn compute(from: &LocalFrame, to: &LocalFrame) -> Self {
        let a = from.reference();
        let b = to.reference();
        let midpoint = GreatCircle::midpoint(a, b);
        let (p, q) = GreatCircle::quarter_points(a, b);
        Self {
            middle: midpoint.point,
            p,
            q,
            theta: midpoint.theta,
            bearing: from.bearing_to(b),
            reverse_bearing: to.bearing_to(a),
        }
    }

    /// The same geometry walked from the second city.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            p: self.q,
            q: self.p,
            bearing: self.reverse_bearing,
            reverse_bearing: self.bearing,
            ..self
        }
    }
}

/// One end of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveEnd {
    pub city_code: u32,
    pub position: GeoPoint,
}

/// Control points of a curve, oriented from the city that emitted it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveGeometry {
    pub begin: CurveEnd,
    pub end: CurveEnd,
    pub middle: GeoPoint,
    pub p: GeoPoint,
    pub q: GeoPoint,
    pub theta: f64,
}

impl CurveGeometry {
    /// Creates the geometry of a curve from its ends and their pair geometry.
    #[must_use]
    pub fn new(begin: CurveEnd, end: CurveEnd, pair: &PairGeometry) -> Self {
        Self {
            begin,
            end,
            middle: pair.middle,
            p: pair.p,
            q: pair.q,
            theta: pair.theta,
        }
    }
}

/// Side of the Earth surface a curve is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurvePosition {
    #[default]
    Above,
    Below,
}

/// A link between two cities for one mode, with its yearly speed ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveDescriptor {
    pub mode_code: u32,
    pub mode_name: String,
    pub geometry: CurveGeometry,
    /// The edge that produced the curve.
    pub edge: EdgeRow,
    pub speed_ratios: BTreeMap<i32, f64>,
}

impl CurveDescriptor {
    /// Returns the speed ratio of `year`, if the curve is drawn that year.
    #[must_use]
    pub fn speed_ratio(&self, year: i32) -> Option<f64> {
        self.speed_ratios.get(&year).copied()
    }

    /// Height of the curve apex over (or under) the surface for `year`.
    ///
    /// Returns `None` when the year has no ratio or the ratio is smaller
    /// than `sin(theta / 2)`.
    #[must_use]
    pub fn apex_height(&self, year: i32, radius: Meters, position: CurvePosition) -> Option<Meters> {
        let ratio = self.speed_ratio(year)?;
        apex_height(ratio, self.geometry.theta, radius, position)
    }
}

/// `(cos(theta/2) + sqrt(ratio^2 - sin^2(theta/2))) * radius - radius`,
/// negated below the surface.
#[must_use]
pub fn apex_height(ratio: f64, theta: f64, radius: Meters, position: CurvePosition) -> Option<Meters> {
    let (sin_half, cos_half) = (theta / 2.0).sin_cos();
    let radicand = ratio * ratio - sin_half * sin_half;
    if radicand.is_nan() || radicand < 0.0 {
        return None;
    }
    let height = (cos_half + radicand.sqrt()) * radius.0 - radius.0;
    Some(Meters(match position {
        CurvePosition::Above => height,
        CurvePosition::Below => -height,
    }))
}

/// Speed used for the curve of a link spanning `theta` radians.
///
/// Non-terrestrial links shorter than `short_hop_threshold` slow down
/// linearly with their length, reaching the nominal speed at the threshold.
#[must_use]
pub fn modelled_speed(theta: f64, speed: f64, terrestrial: bool, short_hop_threshold: f64) -> f64 {
    if terrestrial || theta >= short_hop_threshold {
        speed
    } else {
        speed * theta / short_hop_threshold
    }
}

/// `max_speed * theta / (2 * modelled_speed)`.
#[must_use]
pub fn speed_ratio(max_speed: f64, theta: f64, modelled_speed: f64) -> f64 {
    max_speed * theta / (2.0 * modelled_speed)
}
