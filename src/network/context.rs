use std::collections::{HashMap, HashSet};

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, Result};

use super::curve::PairGeometry;
use super::span::{effective_span, historical_span, YearSpan};
use super::speed::SpeedTables;
use super::store::{CityId, ModeId, NetworkStore};
use super::MergeConfig;

/// Everything a merge pass derives before walking the cities, plus the
/// caches it fills while walking them.
#[derive(Debug)]
pub struct NetworkMergeContext {
    reference: ModeId,
    spans: SecondaryMap<ModeId, YearSpan>,
    span: Option<YearSpan>,
    speeds: SpeedTables,
    pairs: HashMap<(CityId, CityId), PairGeometry>,
    processed: HashSet<(CityId, CityId, String)>,
}

impl NetworkMergeContext {
    /// Resolves the reference mode, the spans and the speed tables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when no mode or several modes carry
    /// the reference name, or when that mode is not terrestrial or has no
    /// speed sample.
    pub fn new(store: &NetworkStore, config: &MergeConfig) -> Result<Self> {
        let reference = find_reference(store, &config.reference_mode_name)?;

        let mut spans = SecondaryMap::new();
        for (id, mode) in store.modes() {
            let span = effective_span(mode.sample_span(), mode.edge_span);
            debug!(mode = %mode.row.name, ?span, "effective span");
            if let Some(span) = span {
                spans.insert(id, span);
            }
        }

        let span = spans.get(reference).and_then(|&reference_span| {
            historical_span(
                reference_span,
                spans
                    .iter()
                    .filter(|(id, _)| *id != reference)
                    .map(|(_, &span)| span),
            )
        });
        if span.is_none() {
            warn!("historical span is empty, cones will be empty");
        }

        let speeds = SpeedTables::compute(store, &spans);
        Ok(Self {
            reference,
            spans,
            span,
            speeds,
            pairs: HashMap::new(),
            processed: HashSet::new(),
        })
    }

    /// Returns the reference mode.
    #[must_use]
    pub fn reference(&self) -> ModeId {
        self.reference
    }

    /// Years covered by the output model.
    #[must_use]
    pub fn span(&self) -> Option<YearSpan> {
        self.span
    }

    /// Returns the effective span of `mode`.
    #[must_use]
    pub fn mode_span(&self, mode: ModeId) -> Option<YearSpan> {
        self.spans.get(mode).copied()
    }

    /// Returns the yearly speed and slope tables.
    #[must_use]
    pub fn speeds(&self) -> &SpeedTables {
        &self.speeds
    }

    /// Geometry from `from` to `to`, computed once per unordered pair.
    pub fn pair(&mut self, store: &NetworkStore, from: CityId, to: CityId) -> Option<PairGeometry> {
        let (key, reversed) = if from <= to {
            ((from, to), false)
        } else {
            ((to, from), true)
        };
        let pair = match self.pairs.get(&key) {
            Some(pair) => *pair,
            None => {
                let pair = PairGeometry::compute(&store.city(key.0)?.frame, &store.city(key.1)?.frame);
                self.pairs.insert(key, pair);
                pair
            }
        };
        Some(if reversed { pair.reversed() } else { pair })
    }

    /// Records that `a` and `b` are linked by `mode_name`; true the first
    /// time, whatever the direction.
    pub fn mark_processed(&mut self, a: CityId, b: CityId, mode_name: &str) -> bool {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        self.processed.insert((low, high, mode_name.to_owned()))
    }

    /// Number of memoized city pairs.
    #[must_use]
    pub fn cached_pairs(&self) -> usize {
        self.pairs.len()
    }
}

fn find_reference(store: &NetworkStore, name: &str) -> Result<ModeId> {
    let id = match store.modes_named(name).as_slice() {
        [] => {
            return Err(ConfigurationError::MissingReferenceMode {
                name: name.to_owned(),
            }
            .into())
        }
        [id] => *id,
        many => {
            return Err(ConfigurationError::AmbiguousReferenceMode {
                name: name.to_owned(),
                count: many.len(),
            }
            .into())
        }
    };
    let mode = store
        .mode(id)
        .ok_or_else(|| ConfigurationError::MissingReferenceMode {
            name: name.to_owned(),
        })?;
    if !mode.row.terrestrial {
        return Err(ConfigurationError::ReferenceModeNotTerrestrial {
            name: name.to_owned(),
        }
        .into());
    }
    if mode.samples.is_empty() {
        return Err(ConfigurationError::ReferenceModeWithoutSpeeds {
            name: name.to_owned(),
        }
        .into());
    }
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TimespaceError;
    use crate::math::{Meters, EARTH_RADIUS_METERS};
    use crate::network::dataset::{Dataset, EdgeRow};
    use crate::network::store::tests::{city, edge, mode, speed};

    fn dataset() -> Dataset {
        Dataset {
            cities: vec![city(1, 2.35, 48.85), city(2, 4.85, 45.76)],
            modes: vec![mode(1, "Road", true), mode(2, "Rail", true), mode(3, "Air", false)],
            speeds: vec![
                speed(1, 1900, 30.0),
                speed(1, 2020, 100.0),
                speed(2, 1850, 40.0),
                speed(2, 2020, 300.0),
                speed(3, 1930, 200.0),
                speed(3, 2020, 800.0),
            ],
            edges: vec![
                EdgeRow {
                    year_begin: 1960,
                    year_end: Some(2000),
                    ..edge(2, 1, 2)
                },
                EdgeRow {
                    year_begin: 1950,
                    ..edge(3, 1, 2)
                },
            ],
            ..Dataset::default()
        }
    }

    fn context(dataset: &Dataset, config: &MergeConfig) -> Result<(NetworkStore, NetworkMergeContext)> {
        let store = NetworkStore::from_dataset(dataset, Meters(EARTH_RADIUS_METERS));
        let context = NetworkMergeContext::new(&store, config)?;
        Ok((store, context))
    }

    #[test]
    fn spans_follow_samples_and_edges() {
        let (store, context) = context(&dataset(), &MergeConfig::default()).unwrap();
        let rail = store.mode_id(2).unwrap();
        let air = store.mode_id(3).unwrap();
        assert_eq!(context.mode_span(rail), YearSpan::new(1960, 2000));
        assert_eq!(context.mode_span(air), YearSpan::new(1950, 2020));
        assert_eq!(context.span(), YearSpan::new(1950, 2020));
        assert_eq!(context.reference(), store.mode_id(1).unwrap());
        assert!(context.speeds().slope(rail, 2001).is_none());
    }

    #[test]
    fn missing_reference_mode_is_fatal() {
        let config = MergeConfig::default().with_reference_mode("Horse");
        let err = context(&dataset(), &config).unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::MissingReferenceMode { .. })
        ));
    }

    #[test]
    fn ambiguous_reference_mode_is_fatal() {
        let mut data = dataset();
        data.modes.push(mode(4, "Road", true));
        let err = context(&data, &MergeConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::AmbiguousReferenceMode { count: 2, .. })
        ));
    }

    #[test]
    fn reference_mode_must_be_terrestrial_with_speeds() {
        let config = MergeConfig::default().with_reference_mode("Air");
        let err = context(&dataset(), &config).unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::ReferenceModeNotTerrestrial { .. })
        ));

        let mut data = dataset();
        data.speeds.retain(|s| s.transport_mode_code != 1);
        let err = context(&data, &MergeConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            TimespaceError::Configuration(ConfigurationError::ReferenceModeWithoutSpeeds { .. })
        ));
    }

    #[test]
    fn pair_geometry_is_memoized_per_unordered_pair() {
        let (store, mut context) = context(&dataset(), &MergeConfig::default()).unwrap();
        let paris = store.city_id(1).unwrap();
        let lyon = store.city_id(2).unwrap();
        let there = context.pair(&store, paris, lyon).unwrap();
        let back = context.pair(&store, lyon, paris).unwrap();
        assert_eq!(context.cached_pairs(), 1);
        assert_eq!(back.p, there.q);
        assert_eq!(back.bearing, there.reverse_bearing);
        assert_eq!(back.theta, there.theta);
    }

    #[test]
    fn processed_pairs_ignore_direction() {
        let (store, mut context) = context(&dataset(), &MergeConfig::default()).unwrap();
        let paris = store.city_id(1).unwrap();
        let lyon = store.city_id(2).unwrap();
        assert!(context.mark_processed(paris, lyon, "Air"));
        assert!(!context.mark_processed(lyon, paris, "Air"));
        assert!(context.mark_processed(lyon, paris, "Rail"));
    }
}
