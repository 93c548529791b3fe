//! Point-in-Polygon (PIP) fire district lookup.
//!
//! Loads district boundaries from GeoJSON and contact details from a JSON
//! table, and resolves points to districts with an R-tree prefilter and a
//! nearest-boundary fallback.

mod boundary;
mod contacts;
pub mod geometry;
mod index;

use std::path::PathBuf;

use thiserror::Error;

pub use boundary::{extract_districts, DEFAULT_NAME_PROPERTY};
pub use contacts::load_contacts;
pub use index::{DistrictIndex, MatchKind, Resolution};

/// Reference data could not be read or parsed
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("GeoJSON document is not a FeatureCollection")]
    NotFeatureCollection,
    #[error("invalid contact table: {0}")]
    Json(#[from] serde_json::Error),
}
