pub mod error;
pub mod geodesy;
pub mod interpolation;
pub mod math;
pub mod merger;
pub mod network;
pub mod output;

pub use error::{Result, TimespaceError};
