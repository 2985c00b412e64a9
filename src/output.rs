//! The lookup tables handed to the rendering side.
//!
//! An [`OutputModel`] is built once by a merge pass and never changed; a new
//! pass produces a new model.

use std::collections::BTreeMap;

use crate::geodesy::{GeoPoint, LocalFrame};
use crate::network::{CityRow, ConeProfile, CurveDescriptor, PopulationRow, YearSpan};

/// Speeds toward one destination: mode name to `(year, speed in kph)`.
pub type DestinationModes = BTreeMap<String, Vec<(i32, f64)>>;

/// Everything known about one city after a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct CityCone {
    pub city: CityRow,
    pub position: GeoPoint,
    pub populations: Vec<PopulationRow>,
    pub frame: LocalFrame,
    /// One profile per year of the historical span.
    pub cones: BTreeMap<i32, ConeProfile>,
    /// Terrestrial destinations by city code.
    pub destinations_with_modes: BTreeMap<u32, DestinationModes>,
}

impl CityCone {
    /// Returns the cone profile of `year`, if the year is covered.
    #[must_use]
    pub fn cone(&self, year: i32) -> Option<&ConeProfile> {
        self.cones.get(&year)
    }
}

/// An unordered pair of city codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CityPair {
    low: u32,
    high: u32,
}

impl CityPair {
    /// Creates the pair of two city codes in either order.
    #[must_use]
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Returns the smaller city code.
    #[must_use]
    pub fn low(&self) -> u32 {
        self.low
    }

    /// Returns the larger city code.
    #[must_use]
    pub fn high(&self) -> u32 {
        self.high
    }
}

/// Mode names split by how they are drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportNames {
    /// Terrestrial modes, drawn as cones.
    pub cones: Vec<String>,
    /// Other modes, drawn as curves.
    pub curves: Vec<String>,
}

/// A transport mode as listed in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSummary {
    pub code: u32,
    pub name: String,
    pub terrestrial: bool,
    /// Years the mode can be shown, `None` when there are none.
    pub span: Option<YearSpan>,
}

/// Result of a merge pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputModel {
    pub span: Option<YearSpan>,
    pub transport_names: TransportNames,
    pub modes: Vec<ModeSummary>,
    pub cities: BTreeMap<u32, CityCone>,
    pub curves: BTreeMap<CityPair, BTreeMap<String, CurveDescriptor>>,
}

impl OutputModel {
    /// Returns the merged data of a city by code.
    #[must_use]
    pub fn city(&self, code: u32) -> Option<&CityCone> {
        self.cities.get(&code)
    }

    /// Returns the cone of a city for one year.
    #[must_use]
    pub fn cone(&self, city: u32, year: i32) -> Option<&ConeProfile> {
        self.cities.get(&city)?.cone(year)
    }

    /// Curves between two cities by mode name, in either order.
    #[must_use]
    pub fn curves_between(&self, a: u32, b: u32) -> Option<&BTreeMap<String, CurveDescriptor>> {
        self.curves.get(&CityPair::new(a, b))
    }

    /// Number of curves over every pair.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.values().map(BTreeMap::len).sum()
    }

    /// Read-only view of one year.
    #[must_use]
    pub fn slice(&self, year: i32) -> YearSlice<'_> {
        YearSlice { model: self, year }
    }
}

/// The cones and curves of one year.
#[derive(Debug, Clone, Copy)]
pub struct YearSlice<'a> {
    model: &'a OutputModel,
    year: i32,
}

impl<'a> YearSlice<'a> {
    /// Returns the year of the slice.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Cones of the year by city code.
    pub fn cones(&self) -> impl Iterator<Item = (u32, &'a ConeProfile)> + 'a {
        let year = self.year;
        self.model
            .cities
            .iter()
            .filter_map(move |(&code, city)| city.cone(year).map(|cone| (code, cone)))
    }

    /// Curves with a speed ratio for the year, with that ratio.
    pub fn curves(&self) -> impl Iterator<Item = (CityPair, &'a CurveDescriptor, f64)> + 'a {
        let year = self.year;
        self.model.curves.iter().flat_map(move |(&pair, by_mode)| {
            by_mode
                .values()
                .filter_map(move |curve| curve.speed_ratio(year).map(|ratio| (pair, curve, ratio)))
        })
    }
}
