/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 06/09/2026
Last Modified: 12/10/2026
License: MIT
*/

use super::line_merge::{merge_lines, node_key, NodeKey};
use super::poly_ops::linework;
use crate::structures::BoundingBox;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Geometry, Line, LineString, MultiLineString};
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Decimal places used to identify coincident nodes in a noded network.
pub const NODE_PRECISION: u32 = 9;

/// A set of line segments that behaves like the geometric union of its inputs:
/// every crossing, touching or overlapping pair of input segments is split at
/// the shared points and duplicate segments are removed, so that segments only
/// ever meet at their endpoints.
#[derive(Clone, Debug, Default)]
pub struct LineNetwork {
    segments: Vec<Line<f64>>,
}

impl LineNetwork {
    pub fn from_lines<'a, I>(lines: I) -> LineNetwork
    where
        I: IntoIterator<Item = &'a LineString<f64>>,
    {
        let mut segments = vec![];
        for ls in lines {
            for seg in ls.lines() {
                if seg.start != seg.end
                    && seg.start.x.is_finite()
                    && seg.start.y.is_finite()
                    && seg.end.x.is_finite()
                    && seg.end.y.is_finite()
                {
                    segments.push(seg);
                }
            }
        }
        LineNetwork {
            segments: node_segments(segments),
        }
    }

    /// Builds a network from the linework of any geometries: lines as they are,
    /// polygons by their exterior and interior rings.
    pub fn from_geometries<'a, I>(geoms: I) -> LineNetwork
    where
        I: IntoIterator<Item = &'a Geometry<f64>>,
    {
        let lines: Vec<LineString<f64>> = geoms.into_iter().flat_map(linework).collect();
        LineNetwork::from_lines(lines.iter())
    }

    pub fn segments(&self) -> &[Line<f64>] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut ret: Option<BoundingBox> = None;
        for s in &self.segments {
            let bb = BoundingBox::new(s.start.x, s.end.x, s.start.y, s.end.y);
            match ret.as_mut() {
                Some(r) => r.expand_to(bb),
                None => ret = Some(bb),
            }
        }
        ret
    }

    /// The network as a multi-line, with segments chained through simple nodes.
    pub fn to_multi_line_string(&self) -> MultiLineString<f64> {
        let parts: Vec<LineString<f64>> = self
            .segments
            .iter()
            .map(|s| LineString::new(vec![s.start, s.end]))
            .collect();
        MultiLineString::new(merge_lines(&parts, NODE_PRECISION))
    }
}

fn node_segments(segments: Vec<Line<f64>>) -> Vec<Line<f64>> {
    let scale = 10f64.powi(NODE_PRECISION as i32);
    let tree = RTree::bulk_load(
        segments
            .iter()
            .enumerate()
            .map(|(i, s)| GeomWithData::new(*s, i))
            .collect(),
    );

    let mut split_points: Vec<Vec<Coord<f64>>> = vec![vec![]; segments.len()];
    for (i, seg) in segments.iter().enumerate() {
        for other in tree.locate_in_envelope_intersecting(&seg.envelope()) {
            let j = other.data;
            if j <= i {
                continue;
            }
            match line_intersection(*seg, segments[j]) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    split_points[i].push(intersection);
                    split_points[j].push(intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for c in [intersection.start, intersection.end] {
                        split_points[i].push(c);
                        split_points[j].push(c);
                    }
                }
                None => {}
            }
        }
    }

    let mut seen: HashSet<(NodeKey, NodeKey)> = HashSet::with_capacity(segments.len());
    let mut ret = Vec::with_capacity(segments.len());
    for (seg, extra) in segments.iter().zip(split_points.into_iter()) {
        let d = seg.delta();
        let param = |c: &Coord<f64>| (c.x - seg.start.x) * d.x + (c.y - seg.start.y) * d.y;
        let mut pts = Vec::with_capacity(extra.len() + 2);
        pts.push(seg.start);
        pts.extend(extra);
        pts.push(seg.end);
        pts.sort_by(|a, b| param(a).partial_cmp(&param(b)).unwrap_or(Ordering::Equal));

        let mut from = pts[0];
        for to in pts.iter().skip(1) {
            let (ka, kb) = (node_key(from, scale), node_key(*to, scale));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            if seen.insert(key) {
                ret.push(Line::new(from, *to));
            }
            from = *to;
        }
    }
    ret
}
