//! Typed input tables and the helpers that tie them together.
//!
//! Rows carry the column names of the published dataset files so a
//! front-end can deserialize records straight into them.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigurationError, Result};

/// A city, with coordinates in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRow {
    pub city_code: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Display radius, for island cities lying close to a continent.
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub country_code: Option<u32>,
    #[serde(default)]
    pub country_name: Option<String>,
}

/// Population figures for one city, keyed by column name (`pop1950`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRow {
    pub city_code: u32,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// A transport mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportModeRow {
    pub code: u32,
    pub name: String,
    #[serde(deserialize_with = "flag")]
    pub terrestrial: bool,
}

/// One speed sample of a transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportSpeedRow {
    pub transport_mode_code: u32,
    pub year: i32,
    #[serde(rename = "speedKPH")]
    pub speed_kph: f64,
}

/// An edge of the transport network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRow {
    pub transport_mode_code: u32,
    pub city_code_ori: u32,
    pub city_code_des: u32,
    #[serde(rename = "eYearBegin")]
    pub year_begin: i32,
    /// `None` when the edge is still in service.
    #[serde(rename = "eYearEnd", default)]
    pub year_end: Option<i32>,
}

/// Accepts `true`/`false` as well as the `1`/`0` used in spreadsheets.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Text(s) => match s.trim() {
            "1" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "false" | "FALSE" | "False" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, got {other:?}"
            ))),
        },
    }
}

/// The five tables a dataset is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Cities,
    TransportSpeeds,
    TransportModes,
    Network,
    Populations,
}

impl TableKind {
    /// Recognition order matters: the populations table only needs a
    /// `cityCode` column, so it is tested last.
    const FINGERPRINTS: [(TableKind, &'static [&'static str]); 5] = [
        (
            TableKind::Cities,
            &["cityCode", "latitude", "longitude", "radius"],
        ),
        (
            TableKind::TransportSpeeds,
            &["transportModeCode", "year", "speedKPH"],
        ),
        (TableKind::TransportModes, &["code", "name", "terrestrial"]),
        (
            TableKind::Network,
            &["transportModeCode", "cityCodeDes", "cityCodeOri"],
        ),
        (TableKind::Populations, &["cityCode"]),
    ];

    /// Identifies a table from its column headings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownSchema`] when no table matches.
    pub fn identify<S: AsRef<str>>(headings: &[S]) -> Result<Self> {
        Self::FINGERPRINTS
            .iter()
            .find(|(_, required)| {
                required
                    .iter()
                    .all(|column| headings.iter().any(|h| h.as_ref().trim() == *column))
            })
            .map(|(kind, _)| *kind)
            .ok_or_else(|| {
                ConfigurationError::UnknownSchema {
                    headings: headings.iter().map(|h| h.as_ref().to_owned()).collect(),
                }
                .into()
            })
    }

    /// Returns a human-readable name of the table.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Cities => "cities",
            TableKind::TransportSpeeds => "transport mode speeds",
            TableKind::TransportModes => "transport modes",
            TableKind::Network => "transport network",
            TableKind::Populations => "populations",
        }
    }
}

/// One already-parsed table, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Cities(Vec<CityRow>),
    TransportSpeeds(Vec<TransportSpeedRow>),
    TransportModes(Vec<TransportModeRow>),
    Network(Vec<EdgeRow>),
    Populations(Vec<PopulationRow>),
}

impl Table {
    /// Returns the kind of the table.
    #[must_use]
    pub fn kind(&self) -> TableKind {
        match self {
            Table::Cities(_) => TableKind::Cities,
            Table::TransportSpeeds(_) => TableKind::TransportSpeeds,
            Table::TransportModes(_) => TableKind::TransportModes,
            Table::Network(_) => TableKind::Network,
            Table::Populations(_) => TableKind::Populations,
        }
    }
}

/// The raw tables of one merge pass. Never mutated by the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub cities: Vec<CityRow>,
    pub populations: Vec<PopulationRow>,
    pub modes: Vec<TransportModeRow>,
    pub speeds: Vec<TransportSpeedRow>,
    pub edges: Vec<EdgeRow>,
}

impl Dataset {
    /// Replaces the table of the same kind.
    pub fn set(&mut self, table: Table) {
        match table {
            Table::Cities(rows) => self.cities = rows,
            Table::TransportSpeeds(rows) => self.speeds = rows,
            Table::TransportModes(rows) => self.modes = rows,
            Table::Network(rows) => self.edges = rows,
            Table::Populations(rows) => self.populations = rows,
        }
    }

    /// Kinds of the tables that are still empty.
    #[must_use]
    pub fn missing(&self) -> Vec<TableKind> {
        [
            (TableKind::Cities, self.cities.is_empty()),
            (TableKind::Populations, self.populations.is_empty()),
            (TableKind::TransportSpeeds, self.speeds.is_empty()),
            (TableKind::TransportModes, self.modes.is_empty()),
            (TableKind::Network, self.edges.is_empty()),
        ]
        .into_iter()
        .filter_map(|(kind, empty)| empty.then_some(kind))
        .collect()
    }

    /// Speed samples grouped under their transport mode.
    #[must_use]
    pub fn modes_with_speeds(&self) -> Vec<Joined<'_, TransportModeRow, TransportSpeedRow>> {
        join(
            &self.modes,
            &self.speeds,
            |mode| mode.code,
            |speed| speed.transport_mode_code,
        )
    }

    /// Population records grouped under their city.
    #[must_use]
    pub fn cities_with_populations(&self) -> Vec<Joined<'_, CityRow, PopulationRow>> {
        join(
            &self.cities,
            &self.populations,
            |city| city.city_code,
            |population| population.city_code,
        )
    }
}

/// A left row together with every right row sharing its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<'a, L, R> {
    pub row: &'a L,
    pub matches: Vec<&'a R>,
}

/// Groups `right` by key and attaches each group to the `left` rows with the
/// same key.
///
/// Left order and the relative order of matches are preserved; a left row
/// without matches gets an empty group.
pub fn join<'a, L, R, K, FL, FR>(
    left: &'a [L],
    right: &'a [R],
    left_key: FL,
    right_key: FR,
) -> Vec<Joined<'a, L, R>>
where
    K: Eq + Hash,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut groups: HashMap<K, Vec<&'a R>> = HashMap::new();
    for row in right {
        groups.entry(right_key(row)).or_default().push(row);
    }
    left.iter()
        .map(|row| Joined {
            row,
            matches: groups.get(&left_key(row)).cloned().unwrap_or_default(),
        })
        .collect()
}
