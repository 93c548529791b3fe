//! Point-in-ring and point-to-boundary distance primitives.
//!
//! Rings are tested independently: a point inside any ring of a district is
//! inside the district, even when that ring is a hole of another ring.

use geo::{Coord, Distance, Haversine, LineString, Point};

use crate::models::{Coordinate, DistrictPolygon};

/// Even-odd ray casting along the horizontal line through `point`.
///
/// The ring is treated as cyclic; points exactly on an edge fall wherever the
/// crossing arithmetic puts them.
pub fn point_in_ring(point: Coordinate, ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    if coords.len() < 3 {
        return false;
    }

    let (x, y) = (point.lon, point.lat);
    let mut inside = false;

    for (i, a) in coords.iter().enumerate() {
        let b = &coords[(i + 1) % coords.len()];
        let straddles = (a.y <= y && y < b.y) || (b.y <= y && y < a.y);
        if straddles && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }

    inside
}

pub fn point_in_polygon(point: Coordinate, polygon: &DistrictPolygon) -> bool {
    polygon.rings.iter().any(|ring| point_in_ring(point, ring))
}

/// Great-circle distance in meters from `point` to the segment `a`-`b`.
///
/// The nearest point is found by projecting in lon/lat space and clamping to
/// the segment; only the final measurement is geodesic.
pub fn distance_point_to_segment(point: Coordinate, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;

    let nearest = if len_sq == 0.0 {
        a
    } else {
        let t = (((point.lon - a.x) * dx + (point.lat - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        }
    };

    Haversine.distance(point.to_point(), Point::from(nearest))
}

/// Minimum distance in meters from `point` to any edge of any ring,
/// including each ring's closing edge. Infinite when there are no edges.
pub fn distance_point_to_polygon(point: Coordinate, polygon: &DistrictPolygon) -> f64 {
    let mut min_distance = f64::INFINITY;

    for ring in &polygon.rings {
        let coords = &ring.0;
        if coords.len() < 2 {
            continue;
        }
        for (i, a) in coords.iter().enumerate() {
            let b = coords[(i + 1) % coords.len()];
            let distance = distance_point_to_segment(point, *a, b);
            if distance < min_distance {
                min_distance = distance;
            }
        }
    }

    min_distance
}
