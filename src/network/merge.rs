use std::collections::BTreeMap;

use tracing::{debug, debug_span, info, warn};

use crate::error::Result;
use crate::output::{
    CityCone, CityPair, DestinationModes, ModeSummary, OutputModel, TransportNames,
};

use super::cone::ConeProfile;
use super::context::NetworkMergeContext;
use super::curve::{modelled_speed, speed_ratio, CurveDescriptor, CurveEnd, CurveGeometry};
use super::dataset::Dataset;
use super::span::YearSpan;
use super::speed::YearSlope;
use super::store::{CityData, CityId, NetworkStore};
use super::MergeConfig;

type CurveTable = BTreeMap<CityPair, BTreeMap<String, CurveDescriptor>>;

/// Builds the time-space model of a dataset.
///
/// The dataset is only read; every call to [`NetworkMerge::execute`]
/// produces a fresh [`OutputModel`].
#[derive(Debug)]
pub struct NetworkMerge<'a> {
    dataset: &'a Dataset,
    config: MergeConfig,
}

impl<'a> NetworkMerge<'a> {
    /// Prepares a merge of `dataset` with `config`.
    #[must_use]
    pub fn new(dataset: &'a Dataset, config: MergeConfig) -> Self {
        Self { dataset, config }
    }

    /// Runs the merge pass.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](crate::error::ConfigurationError)
    /// when the configuration is out of range or the reference mode cannot
    /// be resolved. Inconsistent rows are dropped with a warning instead.
    pub fn execute(&self) -> Result<OutputModel> {
        let _span = debug_span!("network_merge").entered();
        self.config.validate()?;

        let store = NetworkStore::from_dataset(self.dataset, self.config.earth_radius);
        let mut context = NetworkMergeContext::new(&store, &self.config)?;
        info!(
            cities = store.city_count(),
            modes = store.mode_count(),
            edges = store.edge_count(),
            span = ?context.span(),
            "merging network"
        );

        let mut cities = BTreeMap::new();
        let mut curves = CurveTable::new();
        for (id, city) in store.cities() {
            let cone = self.visit_city(&store, &mut context, (id, city), &mut curves);
            cities.insert(city.row.city_code, cone);
        }

        let model = OutputModel {
            span: context.span(),
            transport_names: transport_names(&store),
            modes: store
                .modes()
                .map(|(id, mode)| ModeSummary {
                    code: mode.row.code,
                    name: mode.row.name.clone(),
                    terrestrial: mode.row.terrestrial,
                    span: context.mode_span(id),
                })
                .collect(),
            cities,
            curves,
        };
        info!(
            cities = model.cities.len(),
            curves = model.curve_count(),
            pairs = context.cached_pairs(),
            "network merged"
        );
        Ok(model)
    }

    /// Walks the edges of one city: terrestrial edges feed its cones, the
    /// first edge of each pair and mode emits a curve.
    fn visit_city(
        &self,
        store: &NetworkStore,
        context: &mut NetworkMergeContext,
        (id, city): (CityId, &CityData),
        curves: &mut CurveTable,
    ) -> CityCone {
        let span = context.span();
        let mut destinations: BTreeMap<i32, Vec<(f64, f64)>> = BTreeMap::new();
        let mut fastest: BTreeMap<i32, f64> = BTreeMap::new();
        let mut destinations_with_modes: BTreeMap<u32, DestinationModes> = BTreeMap::new();
        let mut skipped = 0_usize;

        for incidence in &city.incidences {
            let (Some(other), Some(mode)) = (store.city(incidence.other), store.mode(incidence.mode))
            else {
                continue;
            };
            let Some(pair) = context.pair(store, id, incidence.other) else {
                continue;
            };
            let first_visit = context.mark_processed(id, incidence.other, &mode.row.name);
            let terrestrial = mode.row.terrestrial;
            let emits_curve = first_visit && (!terrestrial || self.config.terrestrial_curves);

            let years: Vec<(i32, YearSlope)> = context
                .speeds()
                .years(incidence.mode)
                .filter(|(year, _)| span.is_some_and(|s| s.contains(*year)))
                .collect();

            if terrestrial {
                let speeds = destinations_with_modes
                    .entry(other.row.city_code)
                    .or_default()
                    .entry(mode.row.name.clone())
                    .or_default();
                for &(year, slope) in &years {
                    speeds.push((year, slope.speed_kph));
                    if !pair.bearing.is_finite() || !slope.slope.is_finite() {
                        skipped += 1;
                        continue;
                    }
                    destinations
                        .entry(year)
                        .or_default()
                        .push((pair.bearing, slope.slope));
                    fastest
                        .entry(year)
                        .and_modify(|f| *f = f.min(slope.slope))
                        .or_insert(slope.slope);
                }
            }

            if !emits_curve {
                continue;
            }
            let (speed_ratios, non_finite) =
                self.speed_ratios(context, pair.theta, terrestrial, &years);
            skipped += non_finite;
            if speed_ratios.is_empty() {
                debug!(
                    origin = city.row.city_code,
                    destination = other.row.city_code,
                    mode = %mode.row.name,
                    "no year to draw the curve for"
                );
                continue;
            }
            let geometry = CurveGeometry::new(
                CurveEnd {
                    city_code: city.row.city_code,
                    position: city.position,
                },
                CurveEnd {
                    city_code: other.row.city_code,
                    position: other.position,
                },
                &pair,
            );
            curves
                .entry(CityPair::new(city.row.city_code, other.row.city_code))
                .or_default()
                .insert(
                    mode.row.name.clone(),
                    CurveDescriptor {
                        mode_code: mode.row.code,
                        mode_name: mode.row.name.clone(),
                        geometry,
                        edge: incidence.edge,
                        speed_ratios,
                    },
                );
        }

        if skipped > 0 {
            warn!(city = city.row.city_code, skipped, "non-finite samples skipped");
        }

        let gap_threshold = self.config.gap_threshold();
        let mut cones = BTreeMap::new();
        for year in span.iter().flat_map(YearSpan::years) {
            let Some(road) = context.speeds().slope(context.reference(), year) else {
                continue;
            };
            let cone = match destinations.remove(&year) {
                Some(samples) => ConeProfile::build(
                    road.slope,
                    samples,
                    fastest.get(&year).copied(),
                    gap_threshold,
                ),
                None => ConeProfile::road_only(road.slope),
            };
            cones.insert(year, cone);
        }

        CityCone {
            city: city.row.clone(),
            position: city.position,
            populations: city.populations.clone(),
            frame: city.frame.clone(),
            cones,
            destinations_with_modes,
        }
    }

    /// Speed ratio of a curve for each year; the count of non-finite
    /// ratios left out comes second.
    fn speed_ratios(
        &self,
        context: &NetworkMergeContext,
        theta: f64,
        terrestrial: bool,
        years: &[(i32, YearSlope)],
    ) -> (BTreeMap<i32, f64>, usize) {
        let mut ratios = BTreeMap::new();
        let mut skipped = 0;
        for &(year, slope) in years {
            let Some(max_speed) = context.speeds().max_speed(year) else {
                continue;
            };
            let modelled = modelled_speed(
                theta,
                slope.speed_kph,
                terrestrial,
                self.config.short_hop_threshold,
            );
            let ratio = speed_ratio(max_speed, theta, modelled);
            if ratio.is_finite() {
                ratios.insert(year, ratio);
            } else {
                skipped += 1;
            }
        }
        (ratios, skipped)
    }
}

fn transport_names(store: &NetworkStore) -> TransportNames {
    let mut names = TransportNames::default();
    for (_, mode) in store.modes() {
        if mode.row.terrestrial {
            names.cones.push(mode.row.name.clone());
        } else {
            names.curves.push(mode.row.name.clone());
        }
    }
    names
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, TimespaceError};
    use crate::geodesy::{GeoPoint, GreatCircle};
    use crate::network::cone::SampleKind;
    use crate::network::dataset::EdgeRow;
    use crate::network::store::tests::{city, edge, mode, speed};
    use approx::assert_abs_diff_eq;
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Paris, Lyon, Marseille, New York and an isolated Reykjavik.
    fn dataset() -> Dataset {
        let constant = |code, kph| [speed(code, 2000, kph), speed(code, 2010, kph)];
        Dataset {
            cities: vec![
                city(1, 2.35, 48.85),
                city(2, 4.85, 45.76),
                city(3, 5.37, 43.3),
                city(4, -73.94, 40.67),
                city(5, -21.9, 64.1),
            ],
            modes: vec![mode(1, "Road", true), mode(2, "Rail", true), mode(3, "Air", false)],
            speeds: [constant(1, 80.0), constant(2, 160.0), constant(3, 800.0)].concat(),
            edges: vec![
                edge(2, 1, 2),
                edge(1, 2, 3),
                edge(3, 1, 4),
                edge(3, 4, 1),
                edge(3, 1, 3),
            ],
            ..Dataset::default()
        }
    }

    fn merge(dataset: &Dataset) -> OutputModel {
        init_tracing();
        NetworkMerge::new(dataset, MergeConfig::default()).execute().unwrap()
    }

    #[test]
    fn span_and_transport_names() {
        let model = merge(&dataset());
        assert_eq!(model.span, YearSpan::new(2000, 2010));
        assert_eq!(model.transport_names.cones, vec!["Road", "Rail"]);
        assert_eq!(model.transport_names.curves, vec!["Air"]);
        assert_eq!(model.modes.len(), 3);
        assert!(model.modes.iter().all(|m| m.span == YearSpan::new(2000, 2010)));
    }

    #[test]
    fn cone_slopes_follow_the_fastest_mode() {
        let model = merge(&dataset());
        // Air at 800 kph is the yearly maximum
        let road = (10f64.powi(2) - 1.0).sqrt().atan();
        let rail = (5f64.powi(2) - 1.0).sqrt().atan();

        let paris = model.cone(1, 2005).unwrap();
        assert_abs_diff_eq!(paris.road_slope(), road, epsilon = 1e-12);
        assert_eq!(paris.destinations().len(), 1);
        assert_abs_diff_eq!(paris.destinations()[0].slope, rail, epsilon = 1e-12);
        assert_abs_diff_eq!(paris.fastest_terrestrial_slope().unwrap(), rail, epsilon = 1e-12);

        let lyon = model.cone(2, 2005).unwrap();
        assert_eq!(lyon.destinations().len(), 2);
        assert_abs_diff_eq!(lyon.fastest_terrestrial_slope().unwrap(), rail, epsilon = 1e-12);
        assert!(lyon.samples().iter().any(|s| s.kind == SampleKind::Synthetic));
    }

    #[test]
    fn road_and_rail_without_faster_modes() {
        let mut data = dataset();
        data.modes.truncate(2);
        data.speeds.retain(|s| s.transport_mode_code != 3);
        data.edges.retain(|e| e.transport_mode_code != 3);
        let model = merge(&data);

        let paris = model.cone(1, 2005).unwrap();
        assert_abs_diff_eq!(paris.road_slope(), 3f64.sqrt().atan(), epsilon = 1e-12);
        assert_abs_diff_eq!(paris.road_slope(), 1.047, epsilon = 1e-3);
        assert_eq!(paris.destinations()[0].slope, 0.0);
        assert!(model.curves.is_empty());
    }

    #[test]
    fn isolated_city_gets_a_road_cone_every_year() {
        let model = merge(&dataset());
        let reykjavik = model.city(5).unwrap();
        assert_eq!(reykjavik.cones.len(), 11);
        for cone in reykjavik.cones.values() {
            assert!(cone.destinations().is_empty());
            assert!(cone.road_slope().is_finite());
        }
        assert!(reykjavik.destinations_with_modes.is_empty());

        // an air-only city has no terrestrial destination either
        let new_york = model.city(4).unwrap();
        assert!(new_york.cone(2000).unwrap().destinations().is_empty());
    }

    #[test]
    fn one_curve_per_pair_and_mode() {
        let data = dataset();
        let model = merge(&data);
        let curves = model.curves_between(4, 1).unwrap();
        assert_eq!(curves.len(), 1);
        let air = &curves["Air"];
        let paris = GeoPoint::from_degrees(2.35, 48.85);
        let new_york = GeoPoint::from_degrees(-73.94, 40.67);
        assert_abs_diff_eq!(air.geometry.theta, GreatCircle::distance(&paris, &new_york), epsilon = 1e-12);
        assert_eq!(air.geometry.begin.city_code, 1);
        assert_eq!(air.speed_ratios.len(), 11);
        // Air is the fastest mode and the hop is long: ratio is theta / 2
        assert_abs_diff_eq!(air.speed_ratio(2005).unwrap(), air.geometry.theta / 2.0, epsilon = 1e-12);

        assert_eq!(model.curve_count(), 2);
        assert!(model.curves_between(1, 2).is_none());
    }

    #[test]
    fn short_hops_get_higher_ratios() {
        let model = merge(&dataset());
        let air = &model.curves_between(1, 3).unwrap()["Air"];
        let theta = air.geometry.theta;
        let threshold = MergeConfig::default().short_hop_threshold;
        assert!(theta < threshold);
        assert_abs_diff_eq!(air.speed_ratio(2000).unwrap(), threshold / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn terrestrial_curves_are_optional() {
        let data = dataset();
        init_tracing();
        let config = MergeConfig::default().with_terrestrial_curves(true);
        let model = NetworkMerge::new(&data, config).execute().unwrap();
        assert!(model.curves_between(1, 2).unwrap().contains_key("Rail"));
        assert!(model.curves_between(2, 3).unwrap().contains_key("Road"));
        assert_eq!(model.curve_count(), 4);
    }

    #[test]
    fn destinations_carry_their_speeds() {
        let model = merge(&dataset());
        let lyon = model.city(2).unwrap();
        let to_paris = &lyon.destinations_with_modes[&1]["Rail"];
        assert_eq!(to_paris.len(), 11);
        assert_eq!(to_paris[0], (2000, 160.0));
        assert!(lyon.destinations_with_modes[&3].contains_key("Road"));
    }

    #[test]
    fn links_listed_in_both_directions_count_once() {
        let mut data = dataset();
        data.edges.push(edge(1, 3, 2));
        data.edges.push(edge(1, 2, 3));
        let model = merge(&data);

        let lyon = model.city(2).unwrap();
        assert_eq!(lyon.cone(2005).unwrap().destinations().len(), 2);
        assert_eq!(lyon.destinations_with_modes[&3]["Road"].len(), 11);
        let marseille = model.city(3).unwrap();
        assert_eq!(marseille.cone(2005).unwrap().destinations().len(), 1);
        assert_eq!(marseille.destinations_with_modes[&2]["Road"].len(), 11);
    }

    #[test]
    fn city_without_coordinates_is_left_out_of_its_neighbours() {
        let mut data = dataset();
        data.cities.push(city(6, f64::NAN, 47.0));
        data.edges.push(edge(2, 6, 2));
        data.edges.push(edge(3, 6, 1));
        let model = merge(&data);

        let lyon = model.cone(2, 2005).unwrap();
        assert_eq!(lyon.destinations().len(), 2);
        assert!(lyon
            .samples()
            .iter()
            .all(|s| s.bearing.is_finite() && s.slope.is_finite()));
        assert!(model.curves_between(6, 1).is_none());
        assert_eq!(model.curve_count(), 2);

        let lost = model.city(6).unwrap();
        assert_eq!(lost.cones.len(), 11);
        assert!(lost.cone(2005).unwrap().destinations().is_empty());
    }

    #[test]
    fn year_slice_exposes_cones_and_curves() {
        let model = merge(&dataset());
        let slice = model.slice(2003);
        assert_eq!(slice.cones().count(), 5);
        assert_eq!(slice.curves().count(), 2);
        assert_eq!(model.slice(1999).cones().count(), 0);
    }

    #[test]
    fn bad_configuration_aborts_the_pass() {
        let data = dataset();
        let err = NetworkMerge::new(&data, MergeConfig::default().with_reference_mode("Ship"))
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::MissingReferenceMode { .. })
        ));

        let err = NetworkMerge::new(&data, MergeConfig::default().with_cone_step(0.0))
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn inconsistent_edges_are_skipped() {
        let mut data = dataset();
        data.edges.push(edge(1, 1, 42));
        data.edges.push(EdgeRow {
            transport_mode_code: 9,
            ..edge(1, 1, 2)
        });
        let model = merge(&data);
        assert_eq!(model.cone(1, 2005).unwrap().destinations().len(), 1);
    }

    #[test]
    fn modes_only_shape_the_years_they_run() {
        let mut data = dataset();
        data.speeds.retain(|s| !(s.transport_mode_code == 2 && s.year == 2010));
        data.speeds.push(speed(2, 2003, 160.0));
        let model = merge(&data);
        assert_eq!(model.cone(1, 2003).unwrap().destinations().len(), 1);
        let later = model.cone(1, 2004).unwrap();
        assert!(later.destinations().is_empty());
        assert!(later.fastest_terrestrial_slope().is_none());
        assert_eq!(model.city(1).unwrap().cones.len(), 11);
    }
}
