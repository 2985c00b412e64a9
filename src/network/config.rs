use std::f64::consts::TAU;

use crate::error::{ConfigurationError, Result};
use crate::math::{Meters, EARTH_RADIUS_METERS, TOLERANCE};

/// Name of the terrestrial baseline mode in published datasets.
pub const DEFAULT_REFERENCE_MODE: &str = "Road";

/// Arc length below which air links are damped (2000 km).
pub const SHORT_HOP_LENGTH: Meters = Meters(2_000_000.0);

/// Parameters of a merge pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Angular width of one cone facet, in radians.
    pub cone_step: f64,
    /// Gaps between destination bearings wider than
    /// `gap_multiplier * cone_step` receive a road-slope sample.
    pub gap_multiplier: f64,
    /// Central angle under which non-terrestrial links are damped.
    pub short_hop_threshold: f64,
    /// Sphere radius used by every local frame.
    pub earth_radius: Meters,
    /// Name of the reference mode.
    pub reference_mode_name: String,
    /// Also emit curves for terrestrial edges.
    pub terrestrial_curves: bool,
    /// Year whose slice is served to readers; the first year of the
    /// historical span when `None`.
    pub selected_year: Option<i32>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            cone_step: 5f64.to_radians(),
            gap_multiplier: 2.0,
            short_hop_threshold: SHORT_HOP_LENGTH.to_central_angle(Meters(EARTH_RADIUS_METERS)),
            earth_radius: Meters(EARTH_RADIUS_METERS),
            reference_mode_name: DEFAULT_REFERENCE_MODE.to_owned(),
            terrestrial_curves: false,
            selected_year: None,
        }
    }
}

impl MergeConfig {
    /// Sets the angular width of one cone facet.
    #[must_use]
    pub fn with_cone_step(mut self, cone_step: f64) -> Self {
        self.cone_step = cone_step;
        self
    }

    /// Sets the gap multiplier.
    #[must_use]
    pub fn with_gap_multiplier(mut self, gap_multiplier: f64) -> Self {
        self.gap_multiplier = gap_multiplier;
        self
    }

    /// Sets the short-hop threshold, as a central angle.
    #[must_use]
    pub fn with_short_hop_threshold(mut self, threshold: f64) -> Self {
        self.short_hop_threshold = threshold;
        self
    }

    /// Changes the sphere radius.
    ///
    /// A short-hop threshold still at its default is rescaled so it keeps
    /// covering [`SHORT_HOP_LENGTH`]; one set explicitly is kept.
    #[must_use]
    pub fn with_earth_radius(mut self, radius: Meters) -> Self {
        let default = SHORT_HOP_LENGTH.to_central_angle(self.earth_radius);
        if (self.short_hop_threshold - default).abs() < TOLERANCE {
            self.short_hop_threshold = SHORT_HOP_LENGTH.to_central_angle(radius);
        }
        self.earth_radius = radius;
        self
    }

    /// Sets the name of the reference mode.
    #[must_use]
    pub fn with_reference_mode(mut self, name: impl Into<String>) -> Self {
        self.reference_mode_name = name.into();
        self
    }

    /// Enables curves for terrestrial edges.
    #[must_use]
    pub fn with_terrestrial_curves(mut self, enabled: bool) -> Self {
        self.terrestrial_curves = enabled;
        self
    }

    /// Sets the year served to readers.
    #[must_use]
    pub fn with_selected_year(mut self, year: i32) -> Self {
        self.selected_year = Some(year);
        self
    }

    /// Angular gap above which a synthetic road sample is inserted.
    #[must_use]
    pub fn gap_threshold(&self) -> f64 {
        self.gap_multiplier * self.cone_step
    }

    /// Checks every numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ParameterOutOfRange`] for the first
    /// parameter outside its open interval.
    pub fn validate(&self) -> Result<()> {
        check("cone_step", self.cone_step, 0.0, TAU)?;
        check("gap_multiplier", self.gap_multiplier, 0.0, f64::INFINITY)?;
        check("short_hop_threshold", self.short_hop_threshold, 0.0, std::f64::consts::PI)?;
        check("earth_radius", self.earth_radius.0, 0.0, f64::INFINITY)?;
        Ok(())
    }
}

fn check(parameter: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value > min && value < max {
        Ok(())
    } else {
        Err(ConfigurationError::ParameterOutOfRange {
            parameter,
            value,
            min,
            max,
        }
        .into())
    }
}
