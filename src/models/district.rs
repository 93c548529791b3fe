//! Fire district geometry and contact records.

use geo::{BoundingRect, LineString};
use serde::{Deserialize, Serialize};

/// Source geometry type of a district feature.
///
/// Both kinds flatten into the same ring set downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    /// GeoJSON `Polygon`
    SingleRingSet,
    /// GeoJSON `MultiPolygon`
    MultiRingSet,
}

/// A named district boundary.
///
/// Rings are stored in lon/lat (`x`/`y`) order and are not required to be closed.
#[derive(Debug, Clone)]
pub struct DistrictPolygon {
    pub name: String,
    pub kind: GeometryKind,
    pub rings: Vec<LineString<f64>>,
}

impl DistrictPolygon {
    pub fn new(name: impl Into<String>, kind: GeometryKind, rings: Vec<LineString<f64>>) -> Self {
        Self {
            name: name.into(),
            kind,
            rings,
        }
    }

    /// Get the bounding box of all rings as (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.rings
            .iter()
            .filter_map(|ring| ring.bounding_rect())
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}

/// Contact details for a district, keyed by exact district name.
///
/// Field names follow the bundled `burn_lines_lookup.json` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(rename = "DistrictName", default)]
    pub district_name: Option<String>,

    #[serde(rename = "BurnLinePhone", default, skip_serializing_if = "Option::is_none")]
    pub burn_line_phone: Option<String>,

    #[serde(rename = "MainPhone", default, skip_serializing_if = "Option::is_none")]
    pub main_phone: Option<String>,

    #[serde(rename = "Website", default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Originating jurisdiction tag
    #[serde(rename = "OFCDistrict", default, skip_serializing_if = "Option::is_none")]
    pub ofc_district: Option<String>,
}

impl ContactInfo {
    /// The lookup key, if present and non-empty
    pub fn key(&self) -> Option<&str> {
        self.district_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Digits-only form of a phone number, suitable for a `tel:` link
    pub fn dial_string(phone: &str) -> Option<String> {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        (!digits.is_empty()).then_some(digits)
    }
}
