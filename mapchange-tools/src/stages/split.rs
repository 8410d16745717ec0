/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 18/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use super::{check_distance, guarded, has_non_finite, StageOutput, StageReport};
use geo::{Area, BooleanOps, Geometry, Intersects, Line, LineString, MultiPolygon, Point, Polygon};
use mapchange_common::algorithms::{
    is_closed_within, linework, make_valid, polygon_parts, polygonize, ring_to_polygon, LineNetwork,
    AREA_EPSILON,
};
use mapchange_common::parallel::{CancelToken, ProgressSink};
use mapchange_common::structures::BoundingBox;
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::{geometry_type_name, Feature, FeatureCollection, FieldData};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

const STAGE: &str = "Split";

#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Cutting lines whose ends lie this close together are treated as rings.
    pub closure_tolerance: f64,
}

impl Default for SplitOptions {
    fn default() -> SplitOptions {
        SplitOptions {
            closure_tolerance: 1e-4,
        }
    }
}

/// Cutting linework sorted into closed rings, used as areas to subtract, and
/// the noded network of all open lines.
struct Cutters {
    closed: Vec<Polygon<f64>>,
    closed_tree: RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>,
    segment_tree: RTree<GeomWithData<Line<f64>, ()>>,
    bounding_box: Option<BoundingBox>,
}

impl Cutters {
    fn new(cutting_lines: &FeatureCollection, closure_tolerance: f64) -> Cutters {
        let mut closed = vec![];
        let mut plain: Vec<LineString<f64>> = vec![];
        for f in cutting_lines {
            for ls in linework(&f.geometry) {
                if is_closed_within(&ls, closure_tolerance) {
                    if let Some(poly) = ring_to_polygon(&ls, closure_tolerance) {
                        closed.push(poly);
                        continue;
                    }
                    log::debug!("{}: invalid ring kept as a cutting line", STAGE);
                }
                plain.push(ls);
            }
        }
        let closed_tree = RTree::bulk_load(
            closed
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    BoundingBox::from_geometry(&Geometry::Polygon(p.clone()))
                        .map(|bb| GeomWithData::new(Rectangle::from_aabb(bb.to_aabb()), i))
                })
                .collect(),
        );
        let merged_lines = LineNetwork::from_lines(plain.iter());
        let segment_tree = RTree::bulk_load(
            merged_lines
                .segments()
                .iter()
                .map(|s| GeomWithData::new(*s, ()))
                .collect(),
        );
        log::debug!(
            "{}: {} closed cutters, {} cutting segments",
            STAGE,
            closed.len(),
            merged_lines.len()
        );
        Cutters {
            closed,
            closed_tree,
            segment_tree,
            bounding_box: BoundingBox::from_geometries(cutting_lines.geometries()),
        }
    }

    /// Splits the parts of one polygon feature: closed cutters are subtracted
    /// first, then every remaining part crossed by open lines is cut into the
    /// faces of its rings and those lines.
    fn split(&self, parts: Vec<Polygon<f64>>) -> Vec<Polygon<f64>> {
        let mut remaining = parts;
        if let Some(bb) = bounding_box_of(&remaining) {
            for hit in self.closed_tree.locate_in_envelope_intersecting(&bb.to_aabb()) {
                let cutter = &self.closed[hit.data];
                remaining = remaining
                    .into_iter()
                    .flat_map(|p| {
                        if p.intersects(cutter) {
                            p.difference(cutter).0
                        } else {
                            vec![p]
                        }
                    })
                    .filter(|p| p.unsigned_area() > AREA_EPSILON)
                    .collect();
            }
        }
        remaining
            .into_iter()
            .flat_map(|p| self.split_by_lines(p))
            .collect()
    }

    fn split_by_lines(&self, part: Polygon<f64>) -> Vec<Polygon<f64>> {
        let bb = match BoundingBox::from_geometry(&Geometry::Polygon(part.clone())) {
            Some(bb) => bb,
            None => return vec![],
        };
        let envelope = AABB::from_corners(Point::new(bb.min_x, bb.min_y), Point::new(bb.max_x, bb.max_y));
        let crossing: Vec<LineString<f64>> = self
            .segment_tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|s| *s.geom())
            .filter(|s| part.intersects(s))
            .map(|s| LineString::new(vec![s.start, s.end]))
            .collect();
        if crossing.is_empty() {
            return vec![part];
        }

        let mut rings: Vec<LineString<f64>> = vec![part.exterior().clone()];
        rings.extend(part.interiors().iter().cloned());
        rings.extend(crossing);
        let network = LineNetwork::from_lines(rings.iter());
        let pieces: Vec<Polygon<f64>> = polygonize(network.segments())
            .iter()
            .flat_map(|face| face.intersection(&part).0)
            .filter(|p| p.unsigned_area() > AREA_EPSILON)
            .collect();
        if pieces.is_empty() {
            vec![part]
        } else {
            pieces
        }
    }
}

fn bounding_box_of(polys: &[Polygon<f64>]) -> Option<BoundingBox> {
    let geoms: Vec<Geometry<f64>> = polys.iter().cloned().map(Geometry::Polygon).collect();
    BoundingBox::from_geometries(geoms.iter())
}

/// Splits polygons along cutting lines.
///
/// Closed cutting rings are removed from the polygons they overlap; open lines
/// divide each polygon into the faces they enclose together with its rings.
/// Every resulting piece becomes its own feature carrying `FID` and the
/// 1-based `PARENT_FID` of the polygon it came from. Polygons away from all
/// cutting lines are passed through whole.
pub fn split_polygons(
    polygons: &FeatureCollection,
    cutting_lines: &FeatureCollection,
    options: &SplitOptions,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<StageOutput> {
    check_distance("closure tolerance", options.closure_tolerance)?;
    let cutters = Cutters::new(cutting_lines, options.closure_tolerance);

    let mut report = StageReport::new(STAGE);
    let mut output = FeatureCollection::new(polygons.crs.clone());
    output.inherit_crs(cutting_lines);
    let num_features = polygons.len();
    let mut fid = 0i64;
    for (i, f) in polygons.features.iter().enumerate() {
        if cancel.is_cancelled() {
            log::warn!("{}: cancelled after {} of {} features", STAGE, i, num_features);
            return Err(MapChangeError::Cancelled);
        }
        let result = split_feature(i + 1, f, &cutters);
        report.record(&result);
        if let Ok(pieces) = result {
            for piece in pieces {
                fid += 1;
                let mut out = Feature::new(Geometry::Polygon(piece));
                out.set_attribute("FID", FieldData::Int(fid));
                out.set_attribute("PARENT_FID", FieldData::Int(i as i64 + 1));
                output.push(out);
            }
        }
        progress.progress(100.0 * (i + 1) as f64 / num_features as f64, "Splitting polygons");
    }
    if num_features == 0 {
        progress.progress(100.0, "Splitting polygons");
    }

    report.output_features = output.len();
    log::info!("{}", report);
    Ok(StageOutput {
        collection: output,
        report,
    })
}

fn split_feature(feature: usize, f: &Feature, cutters: &Cutters) -> Result<Vec<Polygon<f64>>> {
    let parts = polygon_parts(&f.geometry);
    if parts.is_empty() {
        return Err(MapChangeError::UnsupportedGeometryType {
            feature,
            expected: "Polygon",
            found: geometry_type_name(&f.geometry).to_string(),
        });
    }
    if has_non_finite(&f.geometry) {
        return Err(MapChangeError::GeometryOperationFailure {
            feature,
            message: "non-finite coordinate".to_string(),
        });
    }
    let touches_cutters = match (BoundingBox::from_geometry(&f.geometry), cutters.bounding_box) {
        (Some(bb), Some(cb)) => bb.overlaps(cb),
        _ => false,
    };
    guarded(feature, || {
        let pieces = if touches_cutters { cutters.split(parts) } else { parts };
        // each piece is repaired on its own so neighbours are not fused again
        pieces
            .into_iter()
            .flat_map(|p| make_valid(&MultiPolygon::new(vec![p])).0)
            .collect()
    })
}
