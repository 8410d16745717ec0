/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 04/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use geo::{Coord, Geometry, LineString};
use std::collections::{HashMap, HashSet, VecDeque};

/// Number of decimal places endpoints are rounded to before they are compared.
pub const DEFAULT_MERGE_PRECISION: u32 = 6;

/// Largest precision accepted by the tools; `f64` carries no more decimals.
pub const MAX_MERGE_PRECISION: u32 = 15;

/// Grid key of a coordinate rounded to a fixed number of decimals: the bit
/// patterns of the rounded, scaled ordinates.
pub type NodeKey = (u64, u64);

/// Bit patterns of the rounded, scaled ordinates. Large projected values
/// keep distinct keys at any precision up to `MAX_MERGE_PRECISION`.
pub fn node_key(c: Coord<f64>, scale: f64) -> NodeKey {
    (grid_bits(c.x * scale), grid_bits(c.y * scale))
}

fn grid_bits(v: f64) -> u64 {
    let r = v.round();
    // -0.0 and 0.0 are the same node
    if r == 0.0 {
        0
    } else {
        r.to_bits()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineEnd {
    Start,
    End,
}

/// Flattens the line-valued geometries in `geoms` and merges them with
/// [`merge_lines`]. Non-linear geometries are ignored.
pub fn merge_geometries(geoms: &[Geometry<f64>], precision: u32) -> Vec<LineString<f64>> {
    let mut lines = vec![];
    for g in geoms {
        match g {
            Geometry::LineString(ls) => lines.push(ls.clone()),
            Geometry::MultiLineString(mls) => lines.extend(mls.0.iter().cloned()),
            Geometry::Line(l) => lines.push(LineString::from(vec![l.start, l.end])),
            _ => {}
        }
    }
    merge_lines(&lines, precision)
}

/// Joins line fragments that share an endpoint into maximal polylines.
///
/// Endpoints are compared after rounding to `precision` decimal places. A chain
/// is only continued through a node where exactly two line ends meet; nodes
/// shared by three or more line ends are junctions and always terminate the
/// polylines that touch them. Every non-degenerate input ends up in exactly
/// one output polyline and the junction coordinate is never duplicated.
/// Lines with fewer than two distinct coordinates are dropped and exact
/// duplicates (in either orientation) are collapsed before chaining.
pub fn merge_lines(lines: &[LineString<f64>], precision: u32) -> Vec<LineString<f64>> {
    let scale = 10f64.powi(precision as i32);

    let parts = dedup_lines(
        lines.iter().filter_map(|ls| clean_coords(&ls.0, scale)).collect(),
        scale,
    );
    let num_parts = parts.len();

    // endpoint index
    let mut end_nodes: HashMap<NodeKey, Vec<(usize, LineEnd)>> = HashMap::new();
    for (i, coords) in parts.iter().enumerate() {
        end_nodes
            .entry(node_key(coords[0], scale))
            .or_default()
            .push((i, LineEnd::Start));
        end_nodes
            .entry(node_key(coords[coords.len() - 1], scale))
            .or_default()
            .push((i, LineEnd::End));
    }

    let next_line = |key: NodeKey, claimed: &[bool]| -> Option<(usize, LineEnd)> {
        let entries = end_nodes.get(&key)?;
        if entries.len() != 2 {
            return None;
        }
        let mut unclaimed = entries.iter().filter(|(id, _)| !claimed[*id]);
        let candidate = unclaimed.next().copied();
        if unclaimed.next().is_some() {
            return None;
        }
        candidate
    };

    let mut claimed = vec![false; num_parts];
    let mut output = Vec::with_capacity(num_parts);
    for i in 0..num_parts {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;
        let mut chain: VecDeque<Coord<f64>> = parts[i].iter().copied().collect();

        // forward from the tail
        while let Some(&tail) = chain.back() {
            let (j, end) = match next_line(node_key(tail, scale), &claimed) {
                Some(v) => v,
                None => break,
            };
            claimed[j] = true;
            let coords = &parts[j];
            match end {
                LineEnd::Start => chain.extend(coords[1..].iter().copied()),
                LineEnd::End => chain.extend(coords.iter().rev().skip(1).copied()),
            }
        }

        // backward from the head
        while let Some(&head) = chain.front() {
            let (j, end) = match next_line(node_key(head, scale), &claimed) {
                Some(v) => v,
                None => break,
            };
            claimed[j] = true;
            let coords = &parts[j];
            match end {
                LineEnd::End => {
                    for c in coords[..coords.len() - 1].iter().rev() {
                        chain.push_front(*c);
                    }
                }
                LineEnd::Start => {
                    for c in coords[1..].iter() {
                        chain.push_front(*c);
                    }
                }
            }
        }

        output.push(chain.into_iter().collect::<Vec<Coord<f64>>>());
    }

    // final coalescing pass
    let num_chains = output.len();
    let output: Vec<LineString<f64>> = dedup_lines(
        output
            .into_iter()
            .filter_map(|coords| clean_coords(&coords, scale))
            .collect(),
        scale,
    )
    .into_iter()
    .map(LineString::new)
    .collect();

    if output.len() < num_chains {
        // removing an overlapping chain can turn a junction into a simple node
        return merge_lines(&output, precision);
    }
    output
}

/// Removes consecutive coordinates that round to the same key. Returns `None`
/// when fewer than two distinct coordinates remain.
fn clean_coords(coords: &[Coord<f64>], scale: f64) -> Option<Vec<Coord<f64>>> {
    let mut ret: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    let mut last_key: Option<NodeKey> = None;
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return None;
        }
        let k = node_key(*c, scale);
        if last_key != Some(k) {
            ret.push(*c);
            last_key = Some(k);
        }
    }
    if ret.len() < 2 {
        return None;
    }
    Some(ret)
}

fn dedup_lines(lines: Vec<Vec<Coord<f64>>>, scale: f64) -> Vec<Vec<Coord<f64>>> {
    let mut seen: HashSet<Vec<NodeKey>> = HashSet::with_capacity(lines.len());
    let mut ret = Vec::with_capacity(lines.len());
    for coords in lines {
        let forward: Vec<NodeKey> = coords.iter().map(|c| node_key(*c, scale)).collect();
        let mut backward = forward.clone();
        backward.reverse();
        let key = if forward <= backward { forward } else { backward };
        if seen.insert(key) {
            ret.push(coords);
        }
    }
    ret
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{line_string, MultiLineString};
    use proptest::prelude::*;

    fn sorted_keys(lines: &[LineString<f64>]) -> Vec<Vec<NodeKey>> {
        let scale = 1e6;
        let mut ret: Vec<Vec<NodeKey>> = lines
            .iter()
            .map(|ls| {
                let f: Vec<NodeKey> = ls.0.iter().map(|c| node_key(*c, scale)).collect();
                let mut b = f.clone();
                b.reverse();
                if f <= b {
                    f
                } else {
                    b
                }
            })
            .collect();
        ret.sort();
        ret
    }

    #[test]
    fn two_touching_segments_become_one() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]
        );
    }

    #[test]
    fn reversed_and_prepended_parts_are_joined() {
        let lines = vec![
            line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)],
            line_string![(x: 3.0, y: 1.0), (x: 2.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 0.0, y: 0.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 1.0)]
        );
    }

    #[test]
    fn endpoints_within_precision_are_matched() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0000000001, y: 0.0), (x: 2.0, y: 0.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 3);
    }

    #[test]
    fn junctions_stop_chains() {
        // three spokes meeting at the origin
        let lines = vec![
            line_string![(x: -1.0, y: 0.0), (x: 0.0, y: 0.0)],
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn degenerate_lines_are_dropped_and_isolated_lines_kept() {
        let lines = vec![
            line_string![(x: 5.0, y: 5.0), (x: 5.0, y: 5.0)],
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 3.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged, vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 3.0)]]);
    }

    #[test]
    fn closed_chain_becomes_ring() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 4);
        assert_eq!(merged[0].0.first(), merged[0].0.last());
    }

    #[test]
    fn duplicates_collapse() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 0.0, y: 0.0)],
        ];
        let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn multi_line_strings_are_flattened() {
        let geoms = vec![Geometry::MultiLineString(MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        ]))];
        let merged = merge_geometries(&geoms, DEFAULT_MERGE_PRECISION);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 3);
    }

    #[test]
    fn projected_coordinates_survive_high_precision() {
        // zone-prefixed Gauss-Kruger eastings
        let (x0, y0) = (39_512_345.0, 3_456_789.0);
        let disjoint = vec![
            line_string![(x: x0, y: y0), (x: x0 + 10.0, y: y0)],
            line_string![(x: x0, y: y0 + 5.0), (x: x0 + 10.0, y: y0 + 5.0)],
        ];
        for precision in [6, 12, 15] {
            assert_eq!(merge_lines(&disjoint, precision).len(), 2, "precision {}", precision);
        }

        let touching = vec![
            line_string![(x: x0, y: y0), (x: x0 + 10.0, y: y0)],
            line_string![(x: x0 + 10.0, y: y0), (x: x0 + 10.0, y: y0 + 7.5)],
        ];
        for precision in [6, 12, 15] {
            let merged = merge_lines(&touching, precision);
            assert_eq!(merged.len(), 1, "precision {}", precision);
            assert_eq!(merged[0].0.len(), 3);
        }
    }

    #[test]
    fn signed_zero_is_one_node() {
        let lines = vec![
            line_string![(x: -1.0, y: 0.0), (x: -0.0, y: 0.0)],
            line_string![(x: 0.0, y: -0.0), (x: 1.0, y: 0.0)],
        ];
        assert_eq!(merge_lines(&lines, DEFAULT_MERGE_PRECISION).len(), 1);
    }

    fn shifted(lines: &[LineString<f64>], dx: f64, dy: f64) -> Vec<LineString<f64>> {
        lines
            .iter()
            .map(|ls| LineString::new(ls.0.iter().map(|c| Coord { x: c.x + dx, y: c.y + dy }).collect()))
            .collect()
    }

    fn segment_strategy() -> impl Strategy<Value = LineString<f64>> {
        // endpoints on a small integer lattice so that lines share nodes often
        (0i32..5, 0i32..5, 0i32..5, 0i32..5).prop_map(|(a, b, c, d)| {
            line_string![(x: a as f64, y: b as f64), (x: c as f64, y: d as f64)]
        })
    }

    proptest! {
        #[test]
        fn merging_is_idempotent(lines in prop::collection::vec(segment_strategy(), 0..25)) {
            let once = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
            let twice = merge_lines(&once, DEFAULT_MERGE_PRECISION);
            prop_assert_eq!(sorted_keys(&once), sorted_keys(&twice));
        }

        #[test]
        fn free_endpoints_are_preserved(lines in prop::collection::vec(segment_strategy(), 0..25)) {
            let scale = 1e6;
            let merged = merge_lines(&lines, DEFAULT_MERGE_PRECISION);
            let degree = |ls: &[LineString<f64>]| {
                let mut d: HashMap<NodeKey, usize> = HashMap::new();
                for l in ls {
                    *d.entry(node_key(l.0[0], scale)).or_default() += 1;
                    *d.entry(node_key(*l.0.last().unwrap(), scale)).or_default() += 1;
                }
                d
            };
            let cleaned: Vec<LineString<f64>> = dedup_lines(
                lines.iter().filter_map(|l| clean_coords(&l.0, scale)).collect(),
                scale,
            )
            .into_iter()
            .map(LineString::new)
            .collect();
            let mut free_in: Vec<NodeKey> = degree(&cleaned).into_iter().filter(|(_, n)| *n == 1).map(|(k, _)| k).collect();
            let mut free_out: Vec<NodeKey> = degree(&merged).into_iter().filter(|(_, n)| *n == 1).map(|(k, _)| k).collect();
            free_in.sort();
            free_out.sort();
            prop_assert_eq!(free_in, free_out);
        }

        #[test]
        fn projected_offsets_merge_like_local_coordinates(
            lines in prop::collection::vec(segment_strategy(), 0..25),
            precision in prop::sample::select(vec![6u32, 9, 12, 15]),
        ) {
            let local = merge_lines(&lines, precision);
            let projected = merge_lines(&shifted(&lines, 3.9e7, 4.3e6), precision);
            prop_assert_eq!(local.len(), projected.len());
            prop_assert_eq!(
                sorted_keys(&shifted(&local, 3.9e7, 4.3e6)),
                sorted_keys(&projected)
            );
        }
    }
}
