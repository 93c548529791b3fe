//! District boundary extraction from GeoJSON.

use geo::{Coord, LineString};
use geojson::{Feature, Value};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::LoadError;
use crate::models::{DistrictPolygon, GeometryKind};

/// Default feature property holding the district name
pub const DEFAULT_NAME_PROPERTY: &str = "Agency_Name";

/// Parse a GeoJSON feature collection into district polygons.
///
/// Each feature is converted on its own: one that fails to parse, or has no
/// usable name or geometry, is skipped and logged. Only a document that is not
/// a feature collection at all is an error. Load order is preserved.
pub fn extract_districts(
    geojson: &str,
    name_property: &str,
) -> Result<Vec<DistrictPolygon>, LoadError> {
    let document: JsonValue = serde_json::from_str(geojson)?;

    let is_collection =
        document.get("type").and_then(JsonValue::as_str) == Some("FeatureCollection");
    let features = match document.get("features").and_then(JsonValue::as_array) {
        Some(features) if is_collection => features,
        _ => return Err(LoadError::NotFeatureCollection),
    };

    let total = features.len();
    let mut districts = Vec::with_capacity(total);

    for (i, raw) in features.iter().enumerate() {
        let JsonValue::Object(object) = raw else {
            warn!("Skipping feature {} that is not a JSON object", i);
            continue;
        };
        let feature = match Feature::from_json_object(object.clone()) {
            Ok(feature) => feature,
            Err(e) => {
                warn!("Skipping malformed feature {}: {}", i, e);
                continue;
            }
        };

        let name = match feature_name(&feature, name_property) {
            Some(name) => name,
            None => {
                warn!(
                    "Skipping feature {} without a '{}' string property",
                    i, name_property
                );
                continue;
            }
        };

        match district_from_feature(name, &feature) {
            Some(district) => districts.push(district),
            None => warn!("Failed to normalize coordinates for district: {}", name),
        }
    }

    info!(
        "Loaded {} of {} district polygons ({} skipped)",
        districts.len(),
        total,
        total - districts.len()
    );

    Ok(districts)
}

fn feature_name<'a>(feature: &'a Feature, name_property: &str) -> Option<&'a str> {
    feature
        .property(name_property)
        .and_then(|v| v.as_str())
        .filter(|name| !name.trim().is_empty())
}

fn district_from_feature(name: &str, feature: &Feature) -> Option<DistrictPolygon> {
    let geometry = feature.geometry.as_ref()?;

    let (kind, raw_rings): (GeometryKind, Vec<&Vec<Vec<f64>>>) = match &geometry.value {
        Value::Polygon(rings) => (GeometryKind::SingleRingSet, rings.iter().collect()),
        Value::MultiPolygon(polygons) => (
            GeometryKind::MultiRingSet,
            polygons.iter().flatten().collect(),
        ),
        _ => {
            debug!("Unsupported geometry type for {}", name);
            return None;
        }
    };

    let mut rings = Vec::with_capacity(raw_rings.len());
    for raw in raw_rings {
        let coords = raw
            .iter()
            .map(|position| to_coord(position))
            .collect::<Option<Vec<_>>>()?;
        if coords.len() >= 3 {
            rings.push(LineString::new(coords));
        }
    }

    if rings.is_empty() {
        return None;
    }

    Some(DistrictPolygon::new(name, kind, rings))
}

/// GeoJSON positions are `[lon, lat, ...]`
fn to_coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Coord { x: *lon, y: *lat }),
        _ => None,
    }
}
