use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::warn;

use crate::geodesy::{GeoPoint, LocalFrame};
use crate::math::Meters;

use super::dataset::{
    CityRow, Dataset, EdgeRow, PopulationRow, TransportModeRow, TransportSpeedRow,
};
use super::span::{EdgeSpan, YearSpan};

slotmap::new_key_type! {
    /// Unique identifier for a city in the network store.
    pub struct CityId;
    /// Unique identifier for a transport mode in the network store.
    pub struct ModeId;
}

/// A transport mode with its speed samples.
#[derive(Debug, Clone)]
pub struct ModeData {
    pub row: TransportModeRow,
    /// Samples sorted by year.
    pub samples: Vec<TransportSpeedRow>,
    /// Years the mode is operated on the network, from the accepted edges.
    pub edge_span: EdgeSpan,
}

impl ModeData {
    /// Years covered by the speed samples.
    #[must_use]
    pub fn sample_span(&self) -> Option<YearSpan> {
        YearSpan::enclosing(self.samples.iter().map(|s| s.year))
    }
}

/// One edge as seen from one of its endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Incidence {
    /// The city at the other end.
    pub other: CityId,
    pub mode: ModeId,
    pub edge: EdgeRow,
}

/// A city placed on the sphere.
#[derive(Debug, Clone)]
pub struct CityData {
    pub row: CityRow,
    pub position: GeoPoint,
    pub frame: LocalFrame,
    pub populations: Vec<PopulationRow>,
    /// Every accepted edge touching this city, in dataset order.
    pub incidences: Vec<Incidence>,
}

/// Arena owning the cities and modes of one merge pass.
///
/// Iteration follows the order of the input tables.
#[derive(Debug, Default)]
pub struct NetworkStore {
    cities: SlotMap<CityId, CityData>,
    modes: SlotMap<ModeId, ModeData>,
    city_codes: HashMap<u32, CityId>,
    mode_codes: HashMap<u32, ModeId>,
    city_order: Vec<CityId>,
    mode_order: Vec<ModeId>,
    edge_count: usize,
}

impl NetworkStore {
    /// Builds the store from raw tables.
    ///
    /// Rows with an already seen code are ignored. Edges naming an unknown
    /// city or mode, and edges looping on one city, are dropped.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset, radius: Meters) -> Self {
        let mut store = Self::default();

        for joined in dataset.modes_with_speeds() {
            let code = joined.row.code;
            if store.mode_codes.contains_key(&code) {
                warn!(code, "duplicate transport mode code, keeping the first");
                continue;
            }
            let mut samples: Vec<TransportSpeedRow> = joined.matches.into_iter().copied().collect();
            samples.sort_by_key(|s| s.year);
            let id = store.modes.insert(ModeData {
                row: joined.row.clone(),
                samples,
                edge_span: EdgeSpan::default(),
            });
            store.mode_codes.insert(code, id);
            store.mode_order.push(id);
        }

        for joined in dataset.cities_with_populations() {
            let row = joined.row;
            if store.city_codes.contains_key(&row.city_code) {
                warn!(code = row.city_code, "duplicate city code, keeping the first");
                continue;
            }
            let position = GeoPoint::from_degrees(row.longitude, row.latitude);
            let id = store.cities.insert(CityData {
                row: row.clone(),
                position,
                frame: LocalFrame::with_radius(position, radius),
                populations: joined.matches.into_iter().cloned().collect(),
                incidences: Vec::new(),
            });
            store.city_codes.insert(row.city_code, id);
            store.city_order.push(id);
        }

        let mut windows: HashMap<ModeId, Vec<(i32, Option<i32>)>> = HashMap::new();
        for edge in &dataset.edges {
            let Some(id) = store.insert_edge(edge) else {
                continue;
            };
            windows
                .entry(id)
                .or_default()
                .push((edge.year_begin, edge.year_end));
        }
        for (id, windows) in windows {
            if let Some(mode) = store.modes.get_mut(id) {
                mode.edge_span = EdgeSpan::from_windows(windows);
            }
        }

        let dropped = dataset.edges.len() - store.edge_count;
        if dropped > 0 {
            warn!(dropped, "edges dropped from the network");
        }
        store
    }

    /// Stores `edge` on both endpoints and returns its mode.
    ///
    /// A city keeps one incidence per destination and mode, so a link listed
    /// in both directions or twice is seen once from each end.
    fn insert_edge(&mut self, edge: &EdgeRow) -> Option<ModeId> {
        let (Some(&origin), Some(&destination)) = (
            self.city_codes.get(&edge.city_code_ori),
            self.city_codes.get(&edge.city_code_des),
        ) else {
            warn!(
                origin = edge.city_code_ori,
                destination = edge.city_code_des,
                "edge references an unknown city"
            );
            return None;
        };
        let Some(&mode) = self.mode_codes.get(&edge.transport_mode_code) else {
            warn!(
                mode = edge.transport_mode_code,
                "edge references an unknown transport mode"
            );
            return None;
        };
        if origin == destination {
            warn!(city = edge.city_code_ori, "self-loop edge ignored");
            return None;
        }

        for (from, other) in [(origin, destination), (destination, origin)] {
            let Some(city) = self.cities.get_mut(from) else {
                continue;
            };
            if city
                .incidences
                .iter()
                .any(|seen| seen.other == other && seen.mode == mode)
            {
                continue;
            }
            city.incidences.push(Incidence {
                other,
                mode,
                edge: *edge,
            });
        }
        self.edge_count += 1;
        Some(mode)
    }

    /// Returns the city data for `id`, if it exists.
    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&CityData> {
        self.cities.get(id)
    }

    /// Returns the mode data for `id`, if it exists.
    #[must_use]
    pub fn mode(&self, id: ModeId) -> Option<&ModeData> {
        self.modes.get(id)
    }

    /// Looks up a city by its dataset code.
    #[must_use]
    pub fn city_id(&self, code: u32) -> Option<CityId> {
        self.city_codes.get(&code).copied()
    }

    /// Looks up a mode by its dataset code.
    #[must_use]
    pub fn mode_id(&self, code: u32) -> Option<ModeId> {
        self.mode_codes.get(&code).copied()
    }

    /// Cities in table order.
    pub fn cities(&self) -> impl Iterator<Item = (CityId, &CityData)> + '_ {
        self.city_order
            .iter()
            .filter_map(|&id| self.cities.get(id).map(|city| (id, city)))
    }

    /// Modes in table order.
    pub fn modes(&self) -> impl Iterator<Item = (ModeId, &ModeData)> + '_ {
        self.mode_order
            .iter()
            .filter_map(|&id| self.modes.get(id).map(|mode| (id, mode)))
    }

    /// Modes whose name is exactly `name`.
    #[must_use]
    pub fn modes_named(&self, name: &str) -> Vec<ModeId> {
        self.modes()
            .filter(|(_, mode)| mode.row.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of cities in the store.
    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Number of transport modes in the store.
    #[must_use]
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Number of accepted edges, duplicates included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
