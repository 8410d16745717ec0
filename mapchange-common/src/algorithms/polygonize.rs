/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 08/09/2026
Last Modified: 13/10/2026
License: MIT
*/

use super::line_merge::{node_key, NodeKey};
use super::noding::NODE_PRECISION;
use super::poly_ops::AREA_EPSILON;
use geo::{Contains, Coord, Line, LineString, Point, Polygon};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Extracts the bounded faces enclosed by a noded set of segments.
///
/// The segments must only meet at their endpoints (see `LineNetwork`).
/// Dangling edges are pruned, the remaining planar graph is walked face by
/// face keeping each face on the left, and counter-clockwise cycles become
/// polygon shells. The clockwise outer boundary of a component that sits
/// inside a face of another component becomes a hole of the smallest such face.
pub fn polygonize(segments: &[Line<f64>]) -> Vec<Polygon<f64>> {
    let scale = 10f64.powi(NODE_PRECISION as i32);

    // nodes
    let mut node_ids: HashMap<NodeKey, usize> = HashMap::new();
    let mut nodes: Vec<Coord<f64>> = vec![];
    let mut node_id = |c: Coord<f64>, nodes: &mut Vec<Coord<f64>>| -> usize {
        *node_ids.entry(node_key(c, scale)).or_insert_with(|| {
            nodes.push(c);
            nodes.len() - 1
        })
    };

    // undirected edges
    let mut edge_set: HashSet<(usize, usize)> = HashSet::new();
    let mut edges: Vec<(usize, usize)> = vec![];
    for s in segments {
        let a = node_id(s.start, &mut nodes);
        let b = node_id(s.end, &mut nodes);
        if a == b {
            continue;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if edge_set.insert(key) {
            edges.push(key);
        }
    }

    let edges = prune_dangles(edges, nodes.len());
    if edges.len() < 3 {
        return vec![];
    }

    // half-edge 2k runs a -> b, 2k + 1 runs b -> a
    let origin = |h: usize| -> usize {
        let (a, b) = edges[h / 2];
        if h % 2 == 0 {
            a
        } else {
            b
        }
    };
    let dest = |h: usize| origin(h ^ 1);

    let mut outgoing: Vec<Vec<usize>> = vec![vec![]; nodes.len()];
    for h in 0..edges.len() * 2 {
        outgoing[origin(h)].push(h);
    }
    let angle = |h: usize| {
        let (p, q) = (nodes[origin(h)], nodes[dest(h)]);
        (q.y - p.y).atan2(q.x - p.x)
    };
    let mut position = vec![0usize; edges.len() * 2];
    for out in outgoing.iter_mut() {
        out.sort_by(|a, b| angle(*a).partial_cmp(&angle(*b)).unwrap_or(Ordering::Equal));
        for (i, h) in out.iter().enumerate() {
            position[*h] = i;
        }
    }

    // the next half-edge around the face on the left of h is the one just
    // clockwise of h's twin at the destination node
    let next = |h: usize| -> usize {
        let twin = h ^ 1;
        let out = &outgoing[origin(twin)];
        let i = position[twin];
        out[(i + out.len() - 1) % out.len()]
    };

    let components = connected_components(&edges, nodes.len());

    let mut visited = vec![false; edges.len() * 2];
    let mut shells: Vec<(Polygon<f64>, f64, usize)> = vec![];
    let mut hulls: Vec<(LineString<f64>, usize)> = vec![];
    for start in 0..edges.len() * 2 {
        if visited[start] {
            continue;
        }
        let mut ring: Vec<Coord<f64>> = vec![];
        let mut h = start;
        while !visited[h] {
            visited[h] = true;
            ring.push(nodes[origin(h)]);
            h = next(h);
        }
        if ring.len() < 3 {
            continue;
        }
        let area = signed_ring_area(&ring);
        ring.push(ring[0]);
        let component = components[origin(start)];
        if area > AREA_EPSILON {
            shells.push((Polygon::new(LineString::new(ring), vec![]), area, component));
        } else if area < -AREA_EPSILON {
            hulls.push((LineString::new(ring), component));
        }
    }

    // attach the outer boundaries of nested components as holes
    let mut holes: Vec<Vec<LineString<f64>>> = vec![vec![]; shells.len()];
    for (hull, component) in hulls {
        let sample = Point::from(hull.0[0]);
        let mut best: Option<(usize, f64)> = None;
        for (i, (shell, area, shell_component)) in shells.iter().enumerate() {
            if *shell_component == component || !shell.contains(&sample) {
                continue;
            }
            if best.map_or(true, |(_, a)| *area < a) {
                best = Some((i, *area));
            }
        }
        if let Some((i, _)) = best {
            holes[i].push(hull);
        }
    }

    shells
        .into_iter()
        .zip(holes.into_iter())
        .map(|((shell, _, _), interiors)| {
            let (exterior, _) = shell.into_inner();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

fn prune_dangles(edges: Vec<(usize, usize)>, num_nodes: usize) -> Vec<(usize, usize)> {
    let mut degree = vec![0usize; num_nodes];
    let mut incident: Vec<Vec<usize>> = vec![vec![]; num_nodes];
    for (i, (a, b)) in edges.iter().enumerate() {
        degree[*a] += 1;
        degree[*b] += 1;
        incident[*a].push(i);
        incident[*b].push(i);
    }
    let mut removed = vec![false; edges.len()];
    let mut stack: Vec<usize> = (0..num_nodes).filter(|n| degree[*n] == 1).collect();
    while let Some(n) = stack.pop() {
        if degree[n] != 1 {
            continue;
        }
        if let Some(&e) = incident[n].iter().find(|e| !removed[**e]) {
            removed[e] = true;
            let (a, b) = edges[e];
            degree[a] -= 1;
            degree[b] -= 1;
            let other = if a == n { b } else { a };
            if degree[other] == 1 {
                stack.push(other);
            }
        }
    }
    edges
        .into_iter()
        .zip(removed)
        .filter(|(_, r)| !r)
        .map(|(e, _)| e)
        .collect()
}

fn connected_components(edges: &[(usize, usize)], num_nodes: usize) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..num_nodes).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for (a, b) in edges {
        let (ra, rb) = (find(&mut parent, *a), find(&mut parent, *b));
        if ra != rb {
            parent[ra] = rb;
        }
    }
    (0..num_nodes).map(|n| find(&mut parent, n)).collect()
}

fn signed_ring_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    let mut sum = 0f64;
    for i in 0..n {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}
