/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 05/09/2026
Last Modified: 10/10/2026
License: MIT
*/

use geo::{Area, BooleanOps, Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};

/// Areas at or below this value are treated as empty.
pub const AREA_EPSILON: f64 = 1e-9;

/// Returns true if the first and last coordinates of `ls` coincide within `tolerance`.
pub fn is_closed_within(ls: &LineString<f64>, tolerance: f64) -> bool {
    match (ls.0.first(), ls.0.last()) {
        (Some(a), Some(b)) if ls.0.len() > 1 => {
            let (dx, dy) = (a.x - b.x, a.y - b.y);
            (dx * dx + dy * dy).sqrt() <= tolerance
        }
        _ => false,
    }
}

/// The exterior and interior rings of a polygon as one multi-line.
pub fn polygon_boundary(poly: &Polygon<f64>) -> MultiLineString<f64> {
    let mut rings = Vec::with_capacity(poly.interiors().len() + 1);
    rings.push(poly.exterior().clone());
    rings.extend(poly.interiors().iter().cloned());
    MultiLineString::new(rings.into_iter().filter(|r| r.0.len() > 1).collect())
}

/// The boundary of a polygonal geometry, or `None` for any other geometry type.
pub fn boundary_lines(geom: &Geometry<f64>) -> Option<MultiLineString<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(polygon_boundary(p)),
        Geometry::MultiPolygon(mp) => Some(MultiLineString::new(
            mp.0.iter().flat_map(|p| polygon_boundary(p).0).collect(),
        )),
        Geometry::Rect(r) => Some(polygon_boundary(&r.to_polygon())),
        Geometry::Triangle(t) => Some(polygon_boundary(&t.to_polygon())),
        _ => None,
    }
}

/// All linework of a geometry: lines as they are and polygon rings. Points
/// contribute nothing.
pub fn linework(geom: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geom {
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        Geometry::Line(l) => vec![LineString::new(vec![l.start, l.end])],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(linework).collect(),
        other => boundary_lines(other).map(|m| m.0).unwrap_or_default(),
    }
}

/// The polygon parts of a polygonal geometry. Other geometries yield nothing.
pub fn polygon_parts(geom: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geom {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(polygon_parts).collect(),
        _ => vec![],
    }
}

/// Resolves self-intersections and ring orientation by overlaying the
/// polygons with an empty set, dropping parts with no area.
pub fn make_valid(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let fixed = mp.union(&MultiPolygon::new(vec![]));
    MultiPolygon::new(
        fixed
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() > AREA_EPSILON)
            .collect(),
    )
}

/// Interprets a closed line as a polygon boundary. The ring is closed exactly
/// and validated; `None` is returned when it is too short, has no area, or
/// does not resolve to exactly one polygon.
pub fn ring_to_polygon(ls: &LineString<f64>, tolerance: f64) -> Option<Polygon<f64>> {
    if !is_closed_within(ls, tolerance) || ls.0.len() < 4 {
        return None;
    }
    let mut coords: Vec<Coord<f64>> = ls.0.clone();
    let first = coords[0];
    if let Some(last) = coords.last_mut() {
        *last = first;
    }
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }
    let poly = Polygon::new(LineString::new(coords), vec![]);
    if poly.unsigned_area() <= AREA_EPSILON {
        return None;
    }
    let mut valid = make_valid(&MultiPolygon::new(vec![poly]));
    if valid.0.len() != 1 {
        return None;
    }
    valid.0.pop()
}

/// Sum of the areas of a set of polygons.
pub fn total_area(polys: &[Polygon<f64>]) -> f64 {
    polys.iter().map(|p| p.unsigned_area()).sum()
}
