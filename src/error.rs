use thiserror::Error;

/// Top-level error type for the time-space model.
#[derive(Debug, Error)]
pub enum TimespaceError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Fatal errors that abort a merge pass.
///
/// Anything reported here leaves the previously built model in effect.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("no transport mode named {name:?} to act as the reference mode")]
    MissingReferenceMode { name: String },

    #[error("{count} transport modes are named {name:?}; the reference mode is ambiguous")]
    AmbiguousReferenceMode { name: String, count: usize },

    #[error("reference mode {name:?} has no speed samples")]
    ReferenceModeWithoutSpeeds { name: String },

    #[error("reference mode {name:?} is not terrestrial")]
    ReferenceModeNotTerrestrial { name: String },

    #[error("unknown table schema with headings {headings:?}")]
    UnknownSchema { headings: Vec<String> },

    #[error("parameter {parameter} = {value} is out of range ({min}, {max})")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("dataset is incomplete, missing tables: {missing:?}")]
    IncompleteDataset { missing: Vec<&'static str> },
}

/// Convenience type alias for results using [`TimespaceError`].
pub type Result<T> = std::result::Result<T, TimespaceError>;
