use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::geodesy::{GeoPoint, LocalFrame};
use crate::interpolation::Interpolator;
use crate::math::Meters;

/// Distance from a city to the nearest boundary point, by bearing.
///
/// Boundary points are bucketed by bearing into sectors of one cone step;
/// each sector keeps its closest point.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialBoundary {
    profile: Interpolator,
}

impl RadialBoundary {
    /// Projects every ring point into `frame` and keeps the minimum distance
    /// per sector of width `step`.
    ///
    /// Returns `None` when the rings hold no point or `step` is not positive.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_rings(frame: &LocalFrame, rings: &[Vec<GeoPoint>], step: f64) -> Option<Self> {
        if step.is_nan() || step <= 0.0 {
            return None;
        }
        let mut sectors: BTreeMap<i64, f64> = BTreeMap::new();
        for point in rings.iter().flatten() {
            let local = frame.to_local(point);
            let clock = local.y.atan2(local.x);
            let distance = local.norm();
            if !clock.is_finite() || !distance.is_finite() {
                continue;
            }
            for shifted in [clock - TAU, clock, clock + TAU] {
                let sector = (shifted / step).floor() as i64;
                sectors
                    .entry(sector)
                    .and_modify(|d| *d = d.min(distance))
                    .or_insert(distance);
            }
        }
        if sectors.is_empty() {
            return None;
        }
        Some(Self {
            profile: Interpolator::clamped(
                sectors
                    .into_iter()
                    .map(|(sector, distance)| (sector as f64 * step, distance)),
            ),
        })
    }

    /// Boundary distance toward `bearing`.
    #[must_use]
    pub fn distance_at(&self, bearing: f64) -> Meters {
        Meters(self.profile.evaluate(bearing))
    }

    /// `(sector start, distance)` pairs, spanning three turns.
    #[must_use]
    pub fn sectors(&self) -> &[(f64, f64)] {
        self.profile.samples()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame() -> LocalFrame {
        LocalFrame::new(GeoPoint::from_degrees(2.35, 48.85))
    }

    #[test]
    fn circle_gives_a_constant_distance() {
        let frame = frame();
        let ring: Vec<GeoPoint> = (0..36)
            .map(|i| frame.project(f64::from(i) * 10f64.to_radians(), 0.0, Meters::from_km(100.0)))
            .collect();
        let boundary = RadialBoundary::from_rings(&frame, &[ring], 5f64.to_radians()).unwrap();
        for bearing in [0.0, 1.0, 3.0, 6.0] {
            assert_abs_diff_eq!(boundary.distance_at(bearing).km(), 100.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn sector_keeps_the_closest_point() {
        let frame = frame();
        let ring = vec![
            frame.project(0.52, 0.0, Meters::from_km(80.0)),
            frame.project(0.53, 0.0, Meters::from_km(40.0)),
            frame.project(2.05, 0.0, Meters::from_km(120.0)),
        ];
        let step = 0.1;
        let boundary = RadialBoundary::from_rings(&frame, &[ring], step).unwrap();
        assert_eq!(boundary.sectors().len(), 6);
        assert_abs_diff_eq!(boundary.distance_at(0.5).km(), 40.0, epsilon = 1e-3);
        assert_abs_diff_eq!(boundary.distance_at(2.0).km(), 120.0, epsilon = 1e-3);
    }

    #[test]
    fn empty_rings_have_no_boundary() {
        assert!(RadialBoundary::from_rings(&frame(), &[], 0.1).is_none());
        assert!(RadialBoundary::from_rings(&frame(), &[Vec::new()], 0.1).is_none());
        let ring = vec![GeoPoint::from_degrees(3.0, 49.0)];
        assert!(RadialBoundary::from_rings(&frame(), &[ring], 0.0).is_none());
    }
}
