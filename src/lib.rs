//! Burnwatch - fire district lookup and open burning status
//!
//! This library provides the district index, burn status sources and the
//! resolution service shared by the server and lookup binaries.

pub mod config;
pub mod models;
pub mod pip;
pub mod service;
pub mod sources;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use models::{Coordinate, DistrictStatus, ResolutionResult};
pub use pip::DistrictIndex;
pub use service::{CoordinateMode, ResolutionHandle};
pub use sources::{SourceRegistry, StatusFetcher};
