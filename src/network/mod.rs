//! From raw transport tables to cones and curves.
//!
//! [`NetworkMerge`] places the cities on the sphere, resolves the reference
//! mode, derives yearly speeds and slopes, then walks every city to build
//! its cone profiles and the curves of its non-terrestrial links.

mod boundary;
mod cone;
mod config;
mod context;
mod curve;
mod dataset;
mod merge;
mod span;
mod speed;
mod store;

pub use boundary::RadialBoundary;
pub use cone::{cone_clocks, fill_gaps, ConeProfile, ConeSample, ConeShape, SampleKind};
pub use config::{MergeConfig, DEFAULT_REFERENCE_MODE, SHORT_HOP_LENGTH};
pub use context::NetworkMergeContext;
pub use curve::{
    apex_height, modelled_speed, speed_ratio, CurveDescriptor, CurveEnd, CurveGeometry,
    CurvePosition, PairGeometry,
};
pub use dataset::{
    join, CityRow, Dataset, EdgeRow, Joined, PopulationRow, Table, TableKind, TransportModeRow,
    TransportSpeedRow,
};
pub use merge::NetworkMerge;
pub use span::{effective_span, historical_span, EdgeSpan, YearSpan};
pub use speed::{slope_angle, SpeedTables, YearSlope};
pub use store::{CityData, CityId, Incidence, ModeData, ModeId, NetworkStore};
