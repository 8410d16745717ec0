/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 09/09/2026
Last Modified: 11/10/2026
License: MIT
*/

use super::poly_ops::is_closed_within;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Geometry, Intersects, Line, LineString, MultiLineString, MultiPolygon, Point};
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject};

/// Length of the ray cast from each line end when looking for the boundary.
pub const RAY_LENGTH: f64 = 1_000_000.0;

/// Lines whose ends are closer than this are closed and never extended.
pub const EXTEND_CLOSURE_TOLERANCE: f64 = 1e-6;

/// A polygonal zone that extension rays stop against. The zone's rings are
/// indexed so a ray only tests the segments its envelope touches.
pub struct ExtensionBoundary {
    zone: MultiPolygon<f64>,
    edges: RTree<GeomWithData<Line<f64>, ()>>,
}

impl ExtensionBoundary {
    pub fn new(zone: MultiPolygon<f64>) -> ExtensionBoundary {
        let mut edges = vec![];
        for poly in &zone.0 {
            for ring in std::iter::once(poly.exterior()).chain(poly.interiors().iter()) {
                for seg in ring.lines() {
                    if seg.start != seg.end {
                        edges.push(GeomWithData::new(seg, ()));
                    }
                }
            }
        }
        ExtensionBoundary {
            zone,
            edges: RTree::bulk_load(edges),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zone.0.is_empty()
    }

    /// Distance from `origin` along the unit vector `dir` to the nearest
    /// crossing of the zone boundary, or zero if `origin` already lies in the
    /// zone. `None` when the ray misses the zone.
    pub fn distance_along(&self, origin: Coord<f64>, dir: Coord<f64>, ray_length: f64) -> Option<f64> {
        if self.zone.intersects(&Point::from(origin)) {
            return Some(0.0);
        }
        let ray = Line::new(
            origin,
            Coord {
                x: origin.x + dir.x * ray_length,
                y: origin.y + dir.y * ray_length,
            },
        );
        let mut nearest: Option<f64> = None;
        let mut consider = |c: Coord<f64>| {
            let d = ((c.x - origin.x).powi(2) + (c.y - origin.y).powi(2)).sqrt();
            if nearest.map_or(true, |n| d < n) {
                nearest = Some(d);
            }
        };
        for edge in self.edges.locate_in_envelope_intersecting(&ray.envelope()) {
            match line_intersection(ray, *edge.geom()) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => consider(intersection),
                Some(LineIntersection::Collinear { intersection }) => {
                    consider(intersection.start);
                    consider(intersection.end);
                }
                None => {}
            }
        }
        nearest
    }
}

/// Outward unit directions at the start and at the end of a line. Zero-length
/// end segments fall back to the +x direction.
pub fn end_directions(ls: &LineString<f64>) -> (Coord<f64>, Coord<f64>) {
    let n = ls.0.len();
    if n < 2 {
        return (Coord { x: 1.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 });
    }
    (unit(ls.0[0] - ls.0[1]), unit(ls.0[n - 1] - ls.0[n - 2]))
}

fn unit(v: Coord<f64>) -> Coord<f64> {
    let len = (v.x * v.x + v.y * v.y).sqrt();
    if len == 0.0 || !len.is_finite() {
        return Coord { x: 1.0, y: 0.0 };
    }
    Coord {
        x: v.x / len,
        y: v.y / len,
    }
}

/// Extends both ends of an open line. Each end moves outward by
/// `extend_distance` past the nearest boundary crossing on its ray, or by
/// `extend_distance` alone when there is no boundary or the ray misses it.
/// Closed lines and lines with fewer than two coordinates are returned as is.
pub fn extend_line_string(
    ls: &LineString<f64>,
    boundary: Option<&ExtensionBoundary>,
    extend_distance: f64,
) -> LineString<f64> {
    if ls.0.len() < 2 || is_closed_within(ls, EXTEND_CLOSURE_TOLERANCE) {
        return ls.clone();
    }
    let (start_dir, end_dir) = end_directions(ls);
    let start = ls.0[0];
    let end = ls.0[ls.0.len() - 1];
    let length_at = |origin: Coord<f64>, dir: Coord<f64>| -> f64 {
        let hit = boundary.and_then(|b| b.distance_along(origin, dir, RAY_LENGTH));
        hit.unwrap_or(0.0) + extend_distance
    };
    let start_len = length_at(start, start_dir);
    let end_len = length_at(end, end_dir);

    let mut coords = Vec::with_capacity(ls.0.len() + 2);
    coords.push(Coord {
        x: start.x + start_dir.x * start_len,
        y: start.y + start_dir.y * start_len,
    });
    coords.extend(ls.0.iter().copied());
    coords.push(Coord {
        x: end.x + end_dir.x * end_len,
        y: end.y + end_dir.y * end_len,
    });
    LineString::new(coords)
}

/// Extends every part of a line-valued geometry; `None` for other geometry types.
pub fn extend_geometry(
    geom: &Geometry<f64>,
    boundary: Option<&ExtensionBoundary>,
    extend_distance: f64,
) -> Option<Geometry<f64>> {
    match geom {
        Geometry::LineString(ls) => Some(Geometry::LineString(extend_line_string(
            ls,
            boundary,
            extend_distance,
        ))),
        Geometry::MultiLineString(mls) => Some(Geometry::MultiLineString(MultiLineString::new(
            mls.0
                .iter()
                .map(|ls| extend_line_string(ls, boundary, extend_distance))
                .collect(),
        ))),
        Geometry::Line(l) => Some(Geometry::LineString(extend_line_string(
            &LineString::new(vec![l.start, l.end]),
            boundary,
            extend_distance,
        ))),
        _ => None,
    }
}
