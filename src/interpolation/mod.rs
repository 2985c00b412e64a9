//! Piecewise-linear lookup over an ordered `(x, y)` sample table.
//!
//! The same interpolator backs speed-by-year tables, cone slopes by bearing
//! and radial boundaries by bearing.

/// Behaviour outside the sampled x range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Hold the first or last sample value.
    #[default]
    Clamp,
    /// Continue the line through the two nearest samples.
    Linear,
}

/// A piecewise-linear function defined by samples.
///
/// An empty table evaluates to `0.0` everywhere and a single sample to its
/// own value everywhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolator {
    samples: Vec<(f64, f64)>,
    extrapolation: Extrapolation,
}

impl Interpolator {
    /// Builds an interpolator; samples are sorted by x.
    #[must_use]
    pub fn new<I>(samples: I, extrapolation: Extrapolation) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut samples: Vec<(f64, f64)> = samples.into_iter().collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            samples,
            extrapolation,
        }
    }

    /// Shorthand for [`Extrapolation::Clamp`].
    #[must_use]
    pub fn clamped<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(samples, Extrapolation::Clamp)
    }

    /// The sorted samples.
    #[must_use]
    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Returns the behaviour outside the sample range.
    #[must_use]
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    /// Evaluates the function at `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let samples = &self.samples;
        let len = samples.len();
        match len {
            0 => return 0.0,
            1 => return samples[0].1,
            _ => {}
        }

        let index = samples.partition_point(|s| s.0 < x);
        if index < len && samples[index].0 == x {
            return samples[index].1;
        }

        if index == 0 {
            return match self.extrapolation {
                Extrapolation::Clamp => samples[0].1,
                Extrapolation::Linear => lerp(samples[0], samples[1], x),
            };
        }
        if index == len {
            return match self.extrapolation {
                Extrapolation::Clamp => samples[len - 1].1,
                Extrapolation::Linear => lerp(samples[len - 2], samples[len - 1], x),
            };
        }
        lerp(samples[index - 1], samples[index], x)
    }
}

fn lerp(low: (f64, f64), high: (f64, f64), x: f64) -> f64 {
    (high.1 - low.1) * (x - low.0) / (high.0 - low.0) + low.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_decades(extrapolation: Extrapolation) -> Interpolator {
        Interpolator::new([(2000.0, 100.0), (2010.0, 200.0)], extrapolation)
    }

    #[test]
    fn empty_table_is_zero() {
        let f = Interpolator::clamped(Vec::<(f64, f64)>::new());
        assert_eq!(f.evaluate(1950.0), 0.0);
    }

    #[test]
    fn single_sample_is_constant() {
        let f = Interpolator::new([(1990.0, 42.0)], Extrapolation::Linear);
        assert_eq!(f.evaluate(1800.0), 42.0);
        assert_eq!(f.evaluate(2100.0), 42.0);
    }

    #[test]
    fn interpolates_between_samples() {
        assert_abs_diff_eq!(two_decades(Extrapolation::Clamp).evaluate(2005.0), 150.0);
    }

    #[test]
    fn exact_match_returns_stored_value() {
        let f = Interpolator::clamped([(0.0, 1.0), (1.0, 7.0), (3.0, -2.0)]);
        assert_eq!(f.evaluate(1.0), 7.0);
        assert_eq!(f.evaluate(3.0), -2.0);
    }

    #[test]
    fn clamps_outside_range() {
        let f = two_decades(Extrapolation::Clamp);
        assert_eq!(f.evaluate(1990.0), 100.0);
        assert_eq!(f.evaluate(2020.0), 200.0);
    }

    #[test]
    fn extrapolates_outside_range() {
        let f = two_decades(Extrapolation::Linear);
        assert_abs_diff_eq!(f.evaluate(2020.0), 300.0);
        assert_abs_diff_eq!(f.evaluate(1990.0), 0.0);
    }

    #[test]
    fn unordered_samples_are_sorted() {
        let f = Interpolator::clamped([(10.0, 20.0), (0.0, 0.0), (5.0, 5.0)]);
        assert_abs_diff_eq!(f.evaluate(7.5), 12.5);
        assert_eq!(f.samples()[0], (0.0, 0.0));
    }

    #[test]
    fn many_samples_pick_the_right_bracket() {
        let f = Interpolator::clamped((0..100).map(|i| (f64::from(i), f64::from(i * i))));
        assert_abs_diff_eq!(f.evaluate(42.5), (42.0 * 42.0 + 43.0 * 43.0) / 2.0);
    }
}
