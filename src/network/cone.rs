//! Per-city, per-year slope profiles.
//!
//! A profile starts from the bearings of the terrestrial destinations of a
//! city. Sorted and wrapped around the full turn, wide gaps between them are
//! filled with the reference slope so the profile covers every bearing.

use std::f64::consts::TAU;

use crate::interpolation::Interpolator;
use crate::math::TOLERANCE;

/// Origin of a profile sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Bearing of a terrestrial destination.
    Destination,
    /// Reference slope inserted in a wide gap.
    Synthetic,
    /// Copy of the first or last sample shifted by a full turn.
    Mirrored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeSample {
    pub bearing: f64,
    pub slope: f64,
    pub kind: SampleKind,
}

/// How a cone is shaped when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConeShape {
    /// The reference slope in every direction.
    #[default]
    Road,
    /// The slope of the fastest terrestrial mode serving the city, falling
    /// back to the reference slope.
    FastestTerrestrial,
    /// The gap-filled profile.
    Complex,
}

/// The cone of one city for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeProfile {
    road_slope: f64,
    fastest_terrestrial_slope: Option<f64>,
    destinations: Vec<ConeSample>,
    samples: Vec<ConeSample>,
}

impl ConeProfile {
    /// A profile with no destination.
    #[must_use]
    pub fn road_only(road_slope: f64) -> Self {
        Self {
            road_slope,
            fastest_terrestrial_slope: None,
            destinations: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Builds a profile from `(bearing, slope)` destination pairs.
    ///
    /// Gaps wider than `gap_threshold` radians receive a synthetic sample.
    #[must_use]
    pub fn build(
        road_slope: f64,
        destinations: impl IntoIterator<Item = (f64, f64)>,
        fastest_terrestrial_slope: Option<f64>,
        gap_threshold: f64,
    ) -> Self {
        let mut destinations: Vec<ConeSample> = destinations
            .into_iter()
            .map(|(bearing, slope)| ConeSample {
                bearing,
                slope,
                kind: SampleKind::Destination,
            })
            .collect();
        destinations.sort_by(|a, b| a.bearing.total_cmp(&b.bearing));
        let samples = fill_gaps(&destinations, road_slope, gap_threshold);
        Self {
            road_slope,
            fastest_terrestrial_slope,
            destinations,
            samples,
        }
    }

    /// Returns the slope of the reference mode.
    #[must_use]
    pub fn road_slope(&self) -> f64 {
        self.road_slope
    }

    /// Returns the smallest slope among terrestrial destinations.
    #[must_use]
    pub fn fastest_terrestrial_slope(&self) -> Option<f64> {
        self.fastest_terrestrial_slope
    }

    /// Destination samples sorted by bearing.
    #[must_use]
    pub fn destinations(&self) -> &[ConeSample] {
        &self.destinations
    }

    /// The gap-filled profile, spanning slightly more than a full turn.
    #[must_use]
    pub fn samples(&self) -> &[ConeSample] {
        &self.samples
    }

    /// Slope of the gap-filled profile toward `bearing`.
    #[must_use]
    pub fn slope_at(&self, bearing: f64) -> f64 {
        if self.samples.is_empty() {
            return self.road_slope;
        }
        Interpolator::clamped(self.samples.iter().map(|s| (s.bearing, s.slope))).evaluate(bearing)
    }

    /// Slopes of the cone for every bearing of `clocks`.
    #[must_use]
    pub fn slopes_at(&self, clocks: &[f64], shape: ConeShape) -> Vec<f64> {
        if self.destinations.is_empty() {
            return vec![self.road_slope; clocks.len()];
        }
        match shape {
            ConeShape::Road => vec![self.road_slope; clocks.len()],
            ConeShape::FastestTerrestrial => {
                let slope = self.fastest_terrestrial_slope.unwrap_or(self.road_slope);
                vec![slope; clocks.len()]
            }
            ConeShape::Complex => {
                let profile =
                    Interpolator::clamped(self.samples.iter().map(|s| (s.bearing, s.slope)));
                clocks.iter().map(|&clock| profile.evaluate(clock)).collect()
            }
        }
    }
}

/// Wraps sorted destination samples around the full turn and fills every
/// gap wider than `threshold` with a `road_slope` sample at its middle.
///
/// The last sample is mirrored a full turn below the first one and the
/// first a full turn above the last one, so the wrap-around gap is filled
/// on both sides.
#[must_use]
pub fn fill_gaps(sorted: &[ConeSample], road_slope: f64, threshold: f64) -> Vec<ConeSample> {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let mut wrapped = Vec::with_capacity(sorted.len() + 2);
    wrapped.push(ConeSample {
        bearing: last.bearing - TAU,
        kind: SampleKind::Mirrored,
        ..*last
    });
    wrapped.extend_from_slice(sorted);
    wrapped.push(ConeSample {
        bearing: first.bearing + TAU,
        kind: SampleKind::Mirrored,
        ..*first
    });

    let mut filled = Vec::with_capacity(wrapped.len() * 2);
    filled.push(wrapped[0]);
    for pair in wrapped.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.bearing - a.bearing > threshold {
            filled.push(ConeSample {
                bearing: a.bearing + (b.bearing - a.bearing) / 2.0,
                slope: road_slope,
                kind: SampleKind::Synthetic,
            });
        }
        filled.push(b);
    }
    filled
}

/// Bearings of the cone facets: `0, step, 2 step, ...` below a full turn.
#[must_use]
pub fn cone_clocks(step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 {
        return Vec::new();
    }
    // a last facet landing on the full turn up to rounding is the first one
    let end = TAU - TOLERANCE;
    (0_u32..)
        .map(|i| f64::from(i) * step)
        .take_while(|&clock| clock < end)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn degrees(samples: &[ConeSample], kind: SampleKind) -> Vec<f64> {
        samples
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.bearing.to_degrees())
            .collect()
    }

    #[test]
    fn wide_gaps_receive_one_road_sample() {
        let profile = ConeProfile::build(
            1.0,
            [
                (200f64.to_radians(), 0.2),
                (0.0, 0.3),
                (10f64.to_radians(), 0.4),
            ],
            Some(0.2),
            20f64.to_radians(),
        );
        let synthetic = degrees(profile.samples(), SampleKind::Synthetic);

        let between = |low: f64, high: f64| synthetic.iter().filter(|&&b| b > low && b < high).count();
        assert_eq!(between(10.0, 200.0), 1);
        assert_eq!(between(0.0, 10.0), 0);
        let middle = synthetic.iter().find(|&&b| b > 10.0 && b < 200.0).unwrap();
        assert_abs_diff_eq!(*middle, 105.0, epsilon = 1e-9);

        // the 160 degree wrap-around gap is filled from both mirrors
        assert_eq!(between(-170.0, 0.0), 1);
        assert_eq!(between(200.0, 370.0), 1);

        let sample = profile.samples().iter().find(|s| s.kind == SampleKind::Synthetic).unwrap();
        assert_eq!(sample.slope, 1.0);
    }

    #[test]
    fn destinations_are_sorted_and_mirrored() {
        let profile = ConeProfile::build(1.0, [(3.0, 0.3), (1.0, 0.1)], None, 10.0);
        let bearings: Vec<f64> = profile.destinations().iter().map(|s| s.bearing).collect();
        assert_eq!(bearings, vec![1.0, 3.0]);
        let samples = profile.samples();
        assert_eq!(samples.len(), 4);
        assert_abs_diff_eq!(samples[0].bearing, 3.0 - TAU);
        assert_eq!(samples[0].kind, SampleKind::Mirrored);
        assert_abs_diff_eq!(samples[3].bearing, 1.0 + TAU);
        assert_eq!(samples[3].slope, 0.1);
    }

    #[test]
    fn isolated_city_uses_the_road_slope() {
        let profile = ConeProfile::road_only(0.7);
        assert!(profile.destinations().is_empty());
        assert_eq!(profile.slope_at(2.0), 0.7);
        let clocks = cone_clocks(30f64.to_radians());
        for shape in [ConeShape::Road, ConeShape::FastestTerrestrial, ConeShape::Complex] {
            assert_eq!(profile.slopes_at(&clocks, shape), vec![0.7; 12]);
        }
    }

    #[test]
    fn shapes_select_the_slope_source() {
        let profile = ConeProfile::build(1.0, [(0.0, 0.2), (3.0, 0.4)], Some(0.2), 10.0);
        let clocks = [0.0, 1.5, 3.0];
        assert_eq!(profile.slopes_at(&clocks, ConeShape::Road), vec![1.0; 3]);
        assert_eq!(profile.slopes_at(&clocks, ConeShape::FastestTerrestrial), vec![0.2; 3]);
        let complex = profile.slopes_at(&clocks, ConeShape::Complex);
        assert_abs_diff_eq!(complex[0], 0.2);
        assert_abs_diff_eq!(complex[1], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(complex[2], 0.4);
    }

    #[test]
    fn clocks_cover_the_turn_once() {
        let clocks = cone_clocks(5f64.to_radians());
        assert_eq!(clocks.len(), 72);
        assert_eq!(clocks[0], 0.0);
        assert!(*clocks.last().unwrap() < TAU);
        assert!(cone_clocks(0.0).is_empty());
    }
}
