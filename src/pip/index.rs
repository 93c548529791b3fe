//! District index: polygon containment with a nearest-boundary fallback.

use std::path::Path;

use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use tracing::{debug, error, info};

use super::boundary::extract_districts;
use super::contacts::load_contacts;
use super::geometry::{distance_point_to_polygon, point_in_polygon};
use super::LoadError;
use crate::models::{ContactInfo, Coordinate, DistrictPolygon};

/// R-tree entry pointing back at a district by load order
#[derive(Clone)]
struct IndexedDistrict {
    order: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedDistrict {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedDistrict {
    fn new(order: usize, district: &DistrictPolygon) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = district.bbox()?;
        Some(Self {
            order,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// How a district was chosen for a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum MatchKind {
    Contained,
    Nearest { meters: f64 },
}

/// Outcome of [`DistrictIndex::resolve`]
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub district: &'a str,
    pub contact: Option<&'a ContactInfo>,
    pub matched_by: MatchKind,
}

/// Immutable district polygons plus the contact lookup
pub struct DistrictIndex {
    districts: Vec<DistrictPolygon>,
    tree: RTree<IndexedDistrict>,
    contacts: HashMap<String, ContactInfo>,
}

impl DistrictIndex {
    /// Build the index from already-parsed districts and contacts
    pub fn build(districts: Vec<DistrictPolygon>, contacts: HashMap<String, ContactInfo>) -> Self {
        let indexed: Vec<IndexedDistrict> = districts
            .iter()
            .enumerate()
            .filter_map(|(order, district)| IndexedDistrict::new(order, district))
            .collect();
        let tree = RTree::bulk_load(indexed);

        info!(
            "District index built with {} polygons and {} contacts",
            tree.size(),
            contacts.len()
        );

        Self {
            districts,
            tree,
            contacts,
        }
    }

    pub fn empty() -> Self {
        Self::build(Vec::new(), HashMap::new())
    }

    /// Load from in-memory GeoJSON and contact JSON.
    ///
    /// A source that fails to parse leaves its half of the index empty.
    pub fn load(polygon_source: &str, contact_source: &str, name_property: &str) -> Self {
        let districts = extract_districts(polygon_source, name_property).unwrap_or_else(|e| {
            error!("Error loading district polygons: {}", e);
            Vec::new()
        });
        let contacts = load_contacts(contact_source).unwrap_or_else(|e| {
            error!("Error loading contact lookup: {}", e);
            HashMap::new()
        });
        Self::build(districts, contacts)
    }

    /// Load both datasets from disk, degrading to empty on read errors
    pub fn from_files(polygon_path: &Path, contact_path: &Path, name_property: &str) -> Self {
        let polygons = read_source(polygon_path).unwrap_or_else(|e| {
            error!("{}", e);
            String::new()
        });
        let contacts = read_source(contact_path).unwrap_or_else(|e| {
            error!("{}", e);
            String::new()
        });
        Self::load(&polygons, &contacts, name_property)
    }

    /// Resolve a point to a district.
    ///
    /// The first containing polygon in load order wins; otherwise the polygon
    /// with the nearest boundary (first minimum in load order). `None` only
    /// when no polygons are loaded.
    pub fn resolve(&self, point: Coordinate) -> Option<Resolution<'_>> {
        let query_envelope = AABB::from_point([point.lon, point.lat]);

        // Envelope hits come back in tree order, so take the lowest load order
        let contained = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|entry| point_in_polygon(point, &self.districts[entry.order]))
            .map(|entry| entry.order)
            .min();

        let (order, matched_by) = match contained {
            Some(order) => (order, MatchKind::Contained),
            None => {
                debug!(
                    "No district contains ({}, {}), searching for nearest boundary",
                    point.lat, point.lon
                );
                let (order, meters) = self.nearest(point)?;
                (order, MatchKind::Nearest { meters })
            }
        };

        let district = self.districts[order].name.as_str();
        debug!("Resolved ({}, {}) to {} {:?}", point.lat, point.lon, district, matched_by);

        Some(Resolution {
            district,
            contact: self.contact(district),
            matched_by,
        })
    }

    fn nearest(&self, point: Coordinate) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (order, district) in self.districts.iter().enumerate() {
            let distance = distance_point_to_polygon(point, district);
            match best {
                Some((_, min)) if distance >= min => {}
                _ if distance.is_finite() => best = Some((order, distance)),
                _ => {}
            }
        }
        best
    }

    /// Exact, case-sensitive contact lookup
    pub fn contact(&self, district: &str) -> Option<&ContactInfo> {
        self.contacts.get(district)
    }

    /// Districts in load order
    pub fn districts(&self) -> &[DistrictPolygon] {
        &self.districts
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeometryKind;
    use geo::{coord, LineString};
    use std::io::Write;

    fn square(name: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> DistrictPolygon {
        DistrictPolygon::new(
            name,
            GeometryKind::SingleRingSet,
            vec![LineString::new(vec![
                coord! { x: min_x, y: min_y },
                coord! { x: max_x, y: min_y },
                coord! { x: max_x, y: max_y },
                coord! { x: min_x, y: max_y },
            ])],
        )
    }

    fn contact(name: &str) -> ContactInfo {
        ContactInfo {
            district_name: Some(name.to_string()),
            burn_line_phone: Some("503-555-0100".to_string()),
            main_phone: None,
            website: None,
            ofc_district: None,
        }
    }

    fn at(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn grid() -> DistrictIndex {
        let mut contacts = HashMap::new();
        contacts.insert("WEST".to_string(), contact("WEST"));
        DistrictIndex::build(
            vec![
                square("WEST", -123.0, 44.0, -122.0, 45.0),
                square("EAST", -122.0, 44.0, -121.0, 45.0),
                square("FAR", -110.0, 30.0, -109.0, 31.0),
            ],
            contacts,
        )
    }

    #[test]
    fn test_interior_point_resolves_to_its_polygon_only() {
        let index = grid();
        let hit = index.resolve(at(44.5, -122.5)).unwrap();
        assert_eq!(hit.district, "WEST");
        assert_eq!(hit.matched_by, MatchKind::Contained);
        assert!(hit.contact.is_some());

        let hit = index.resolve(at(44.5, -121.5)).unwrap();
        assert_eq!(hit.district, "EAST");
        assert!(hit.contact.is_none());
    }

    #[test]
    fn test_outside_point_falls_back_to_nearest() {
        let index = grid();
        // Just north of EAST
        let hit = index.resolve(at(45.05, -121.4)).unwrap();
        assert_eq!(hit.district, "EAST");
        match hit.matched_by {
            MatchKind::Nearest { meters } => assert!(meters > 5_000.0 && meters < 6_000.0),
            other => panic!("expected nearest match, got {:?}", other),
        }
    }

    #[test]
    fn test_nearest_ties_go_to_load_order() {
        let index = DistrictIndex::build(
            vec![
                square("SOUTH", 0.0, -2.0, 1.0, -1.0),
                square("NORTH", 0.0, 1.0, 1.0, 2.0),
            ],
            HashMap::new(),
        );
        let hit = index.resolve(at(0.0, 0.5)).unwrap();
        assert_eq!(hit.district, "SOUTH");
    }

    #[test]
    fn test_overlap_keeps_first_loaded() {
        // Second polygon's envelope is larger, which changes tree order but not the answer
        let index = DistrictIndex::build(
            vec![
                square("INNER", -1.0, -1.0, 1.0, 1.0),
                square("OUTER", -5.0, -5.0, 5.0, 5.0),
            ],
            HashMap::new(),
        );
        assert_eq!(index.resolve(at(0.0, 0.0)).unwrap().district, "INNER");

        let reversed = DistrictIndex::build(
            vec![
                square("OUTER", -5.0, -5.0, 5.0, 5.0),
                square("INNER", -1.0, -1.0, 1.0, 1.0),
            ],
            HashMap::new(),
        );
        assert_eq!(reversed.resolve(at(0.0, 0.0)).unwrap().district, "OUTER");
    }

    #[test]
    fn test_empty_index_resolves_nothing() {
        let index = DistrictIndex::empty();
        assert!(index.resolve(at(44.5, -122.5)).is_none());
        assert!(index.resolve(at(-89.0, 179.0)).is_none());
    }

    #[test]
    fn test_bad_sources_degrade_to_empty() {
        let index = DistrictIndex::load("{ nope", "also nope", "Agency_Name");
        assert!(index.is_empty());
        assert_eq!(index.contact_count(), 0);
        assert!(index.resolve(at(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_from_files() {
        let mut polygons = tempfile::NamedTempFile::new().unwrap();
        write!(
            polygons,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"Agency_Name":"STAYTON FD"}},"geometry":{{"type":"Polygon","coordinates":[[[-122.9,44.7],[-122.7,44.7],[-122.7,44.9],[-122.9,44.9]]]}}}}]}}"#
        )
        .unwrap();
        let mut contacts = tempfile::NamedTempFile::new().unwrap();
        write!(
            contacts,
            r#"[{{"DistrictName":"STAYTON FD","BurnLinePhone":"503-769-2601"}},{{"DistrictName":""}}]"#
        )
        .unwrap();

        let index = DistrictIndex::from_files(polygons.path(), contacts.path(), "Agency_Name");
        assert_eq!(index.len(), 1);
        assert_eq!(index.contact_count(), 1);

        let hit = index.resolve(at(44.8, -122.8)).unwrap();
        assert_eq!(hit.district, "STAYTON FD");
        assert_eq!(
            hit.contact.and_then(|c| c.burn_line_phone.as_deref()),
            Some("503-769-2601")
        );
    }

    #[test]
    fn test_missing_files_degrade_to_empty() {
        let index = DistrictIndex::from_files(
            Path::new("/nonexistent/districts.geojson"),
            Path::new("/nonexistent/contacts.json"),
            "Agency_Name",
        );
        assert!(index.is_empty());
    }
}
