use std::collections::BTreeMap;

use slotmap::SecondaryMap;

use crate::interpolation::{Extrapolation, Interpolator};

use super::span::YearSpan;
use super::store::{ModeId, NetworkStore};

/// Cone slope of a mode running at `speed` when the fastest mode runs at
/// `max_speed`: `atan(sqrt((max_speed / speed)^2 - 1))`.
///
/// The result lies in `[0, pi/2]`. A mode faster than `max_speed` yields
/// NaN, which is returned as is.
#[must_use]
pub fn slope_angle(max_speed: f64, speed: f64) -> f64 {
    let ratio = max_speed / speed;
    (ratio * ratio - 1.0).sqrt().atan()
}

/// Speed and slope of one mode for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearSlope {
    pub speed_kph: f64,
    pub slope: f64,
}

/// Per-year speeds of every mode and the yearly maximum they define.
#[derive(Debug, Default)]
pub struct SpeedTables {
    max_speed: BTreeMap<i32, f64>,
    modes: SecondaryMap<ModeId, BTreeMap<i32, YearSlope>>,
}

impl SpeedTables {
    /// Interpolates each mode over its effective span, extrapolating
    /// linearly past its samples, then derives every slope from the yearly
    /// maximum.
    #[must_use]
    pub fn compute(store: &NetworkStore, spans: &SecondaryMap<ModeId, YearSpan>) -> Self {
        let mut max_speed: BTreeMap<i32, f64> = BTreeMap::new();
        let mut speeds: SecondaryMap<ModeId, BTreeMap<i32, f64>> = SecondaryMap::new();

        for (id, mode) in store.modes() {
            let Some(span) = spans.get(id) else {
                continue;
            };
            let interpolator = Interpolator::new(
                mode.samples
                    .iter()
                    .map(|s| (f64::from(s.year), s.speed_kph)),
                Extrapolation::Linear,
            );
            let mut by_year = BTreeMap::new();
            for year in span.years() {
                let speed = interpolator.evaluate(f64::from(year));
                max_speed
                    .entry(year)
                    .and_modify(|max| *max = max.max(speed))
                    .or_insert(speed);
                by_year.insert(year, speed);
            }
            speeds.insert(id, by_year);
        }

        let modes = speeds
            .into_iter()
            .map(|(id, by_year)| {
                let slopes = by_year
                    .into_iter()
                    .map(|(year, speed_kph)| {
                        let max = max_speed.get(&year).copied().unwrap_or(speed_kph);
                        (
                            year,
                            YearSlope {
                                speed_kph,
                                slope: slope_angle(max, speed_kph),
                            },
                        )
                    })
                    .collect();
                (id, slopes)
            })
            .collect();

        Self { max_speed, modes }
    }

    /// Fastest speed over every mode for `year`.
    #[must_use]
    pub fn max_speed(&self, year: i32) -> Option<f64> {
        self.max_speed.get(&year).copied()
    }

    /// Returns the speed and slope of `mode` in `year`.
    #[must_use]
    pub fn slope(&self, mode: ModeId, year: i32) -> Option<YearSlope> {
        self.modes.get(mode)?.get(&year).copied()
    }

    /// Every year the mode has a slope for.
    pub fn years(&self, mode: ModeId) -> impl Iterator<Item = (i32, YearSlope)> + '_ {
        self.modes
            .get(mode)
            .into_iter()
            .flat_map(|years| years.iter().map(|(&year, &slope)| (year, slope)))
    }
}
