/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 14/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::prefilter::filter_candidates;
use super::{check_distance, guarded, has_non_finite, StageOutput, StageReport};
use geo::{BooleanOps, Buffer, Geometry, LineString, MultiPolygon};
use mapchange_common::algorithms::{
    boundary_lines, merge_lines, LineNetwork, DEFAULT_MERGE_PRECISION, MAX_MERGE_PRECISION,
};
use mapchange_common::parallel::{BatchRunner, CancelToken, ProgressSink};
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::{geometry_type_name, Feature, FeatureCollection, FieldData};

const STAGE: &str = "Clip";

#[derive(Debug, Clone, PartialEq)]
pub struct ClipOptions {
    /// Width of the blocked zone around the reference boundaries.
    pub buffer_distance: f64,
    /// Decimal places used when joining the surviving fragments.
    pub merge_precision: u32,
}

impl Default for ClipOptions {
    fn default() -> ClipOptions {
        ClipOptions {
            buffer_distance: 0.1,
            merge_precision: DEFAULT_MERGE_PRECISION,
        }
    }
}

/// Removes the parts of the subject polygon boundaries that run within
/// `buffer_distance` of the reference polygon boundaries.
///
/// The subject boundaries are clipped feature by feature on the batch runner.
/// The surviving fragments of all features are then pooled and merged into
/// maximal polylines, so the output carries no subject attributes: each line
/// only gets a 1-based `FID`. Non-polygon subject features are skipped and
/// counted. A reference set without any polygon boundary is an error.
pub fn clip_boundaries(
    subject: &FeatureCollection,
    reference: &FeatureCollection,
    options: &ClipOptions,
    runner: &BatchRunner,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<StageOutput> {
    check_distance("buffer distance", options.buffer_distance)?;
    if options.merge_precision > MAX_MERGE_PRECISION {
        return Err(MapChangeError::InvalidParameter(format!(
            "merge precision must be between 0 and {} decimal places (got {})",
            MAX_MERGE_PRECISION, options.merge_precision
        )));
    }

    let candidates = filter_candidates(reference, subject.bounding_box(), 2.0 * options.buffer_distance);
    let reference_lines: Vec<LineString<f64>> = candidates
        .features
        .iter()
        .filter_map(|f| boundary_lines(&f.geometry))
        .flat_map(|m| m.0)
        .collect();
    if reference_lines.is_empty() {
        return Err(MapChangeError::stage_failure(
            STAGE,
            format!(
                "none of the {} reference features has a polygon boundary",
                candidates.features.len()
            ),
        ));
    }
    log::debug!(
        "{}: {} reference candidates ({} boundary lines)",
        STAGE,
        candidates.features.len(),
        reference_lines.len()
    );

    progress.progress(0.0, "Building blocked zone");
    let network = LineNetwork::from_lines(reference_lines.iter());
    let blocked: MultiPolygon<f64> = network
        .to_multi_line_string()
        .buffer(options.buffer_distance);

    let outcome = runner.run(
        &subject.features,
        |i, f| clip_feature(i + 1, f, &blocked),
        progress,
        "Clipping boundaries",
        cancel,
    );
    if outcome.cancelled {
        return Err(MapChangeError::Cancelled);
    }

    let mut report = StageReport::new(STAGE);
    let mut fragments: Vec<LineString<f64>> = vec![];
    for result in outcome.results {
        report.record(&result);
        if let Ok(lines) = result {
            fragments.extend(lines);
        }
    }

    progress.progress(100.0, "Merging clipped lines");
    let merged = merge_lines(&fragments, options.merge_precision);

    let mut output = FeatureCollection::new(subject.crs.clone());
    output.inherit_crs(reference);
    for (fid, ls) in merged.into_iter().enumerate() {
        let mut f = Feature::new(Geometry::LineString(ls));
        f.set_attribute("FID", FieldData::Int(fid as i64 + 1));
        output.push(f);
    }
    report.output_features = output.len();
    log::info!("{}", report);
    Ok(StageOutput {
        collection: output,
        report,
    })
}

fn clip_feature(feature: usize, f: &Feature, blocked: &MultiPolygon<f64>) -> Result<Vec<LineString<f64>>> {
    let boundary = boundary_lines(&f.geometry).ok_or_else(|| MapChangeError::UnsupportedGeometryType {
        feature,
        expected: "Polygon",
        found: geometry_type_name(&f.geometry).to_string(),
    })?;
    if has_non_finite(&f.geometry) {
        return Err(MapChangeError::GeometryOperationFailure {
            feature,
            message: "non-finite coordinate".to_string(),
        });
    }
    guarded(feature, || {
        blocked
            .clip(&boundary, true)
            .0
            .into_iter()
            .filter(|ls| ls.0.len() > 1)
            .collect()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{line_string, polygon, Intersects, Polygon};
    use mapchange_common::parallel::NullProgress;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0)
        ]
    }

    fn collection(polys: Vec<Polygon<f64>>, crs: Option<&str>) -> FeatureCollection {
        FeatureCollection::from_features(
            polys.into_iter().map(|p| Feature::new(Geometry::Polygon(p))).collect(),
            crs.map(String::from),
        )
    }

    fn run(subject: &FeatureCollection, reference: &FeatureCollection, d: f64) -> Result<StageOutput> {
        let options = ClipOptions {
            buffer_distance: d,
            ..Default::default()
        };
        clip_boundaries(subject, reference, &options, &BatchRunner::new(2, 2), &NullProgress, &CancelToken::new())
    }

    #[test]
    fn fully_blocked_boundary_is_removed() {
        let subject = collection(vec![square(0.0, 0.0, 10.0)], Some("EPSG:4547"));
        let reference = collection(vec![square(0.0, 0.0, 10.0)], None);
        let out = run(&subject, &reference, 1.0).unwrap();
        assert!(out.collection.is_empty());
        assert_eq!(out.report.succeeded, 1);
        assert_eq!(out.collection.crs.as_deref(), Some("EPSG:4547"));
    }

    #[test]
    fn shared_edge_is_cut_away() {
        // the reference shares the subject's right edge
        let subject = collection(vec![square(0.0, 0.0, 10.0)], None);
        let reference = collection(vec![square(10.0, 0.0, 10.0)], Some("EPSG:4326"));
        let out = run(&subject, &reference, 0.5).unwrap();
        assert_eq!(out.collection.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(out.collection.len(), 1);
        match &out.collection.features[0].geometry {
            Geometry::LineString(ls) => {
                // nothing is left on the shared edge
                assert!(ls.0.iter().all(|c| c.x < 9.5 + 1e-6));
                let crossing = line_string![(x: 9.9, y: 1.0), (x: 9.9, y: 9.0)];
                assert!(!ls.intersects(&crossing));
            }
            g => panic!("unexpected geometry {:?}", g),
        }
        assert_eq!(
            out.collection.features[0].get_attribute("FID"),
            Some(&FieldData::Int(1))
        );
    }

    #[test]
    fn non_polygon_subjects_are_counted() {
        let mut subject = collection(vec![square(0.0, 0.0, 10.0)], None);
        subject.push(Feature::new(Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)])));
        let reference = collection(vec![square(20.0, 0.0, 10.0)], None);
        let out = run(&subject, &reference, 0.5).unwrap();
        assert_eq!(out.report.unsupported, 1);
        assert_eq!(out.report.succeeded, 1);
        // the subject is away from the reference so its whole ring survives
        assert_eq!(out.collection.len(), 1);
    }

    #[test]
    fn reference_without_polygons_fails_the_stage() {
        let subject = collection(vec![square(0.0, 0.0, 10.0)], None);
        let reference = FeatureCollection::from_features(
            vec![Feature::new(Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]))],
            None,
        );
        assert!(matches!(
            run(&subject, &reference, 0.5),
            Err(MapChangeError::PipelineStageFailure { .. })
        ));
    }

    #[test]
    fn negative_buffer_is_rejected() {
        let subject = collection(vec![square(0.0, 0.0, 10.0)], None);
        assert!(matches!(
            run(&subject, &subject, -1.0),
            Err(MapChangeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn excessive_merge_precision_is_rejected() {
        let subject = collection(vec![square(0.0, 0.0, 10.0)], None);
        let options = ClipOptions {
            merge_precision: MAX_MERGE_PRECISION + 1,
            ..Default::default()
        };
        assert!(matches!(
            clip_boundaries(&subject, &subject, &options, &BatchRunner::new(2, 2), &NullProgress, &CancelToken::new()),
            Err(MapChangeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn projected_coordinates_keep_their_lines() {
        let (x0, y0) = (39_512_300.0, 3_456_700.0);
        let subject = collection(vec![square(x0, y0, 10.0)], Some("EPSG:4528"));
        let reference = collection(vec![square(x0 + 10.0, y0, 10.0)], None);
        for precision in [6, 12, MAX_MERGE_PRECISION] {
            let options = ClipOptions {
                buffer_distance: 0.5,
                merge_precision: precision,
            };
            let out = clip_boundaries(&subject, &reference, &options, &BatchRunner::new(2, 2), &NullProgress, &CancelToken::new())
                .unwrap();
            // the three free sides join into one line
            assert_eq!(out.collection.len(), 1, "precision {}", precision);
            match &out.collection.features[0].geometry {
                Geometry::LineString(ls) => assert!(ls.0.iter().all(|c| c.x < x0 + 9.5 + 1e-6)),
                g => panic!("unexpected geometry {:?}", g),
            }
        }
    }

    #[test]
    fn clipped_lines_stay_out_of_the_blocked_zone() {
        let subject = collection(vec![square(0.0, 0.0, 10.0), square(10.0, 0.0, 10.0)], None);
        let reference = collection(vec![square(5.0, -5.0, 10.0)], None);
        let out = run(&subject, &reference, 0.5).unwrap();
        let blocked = LineNetwork::from_geometries(reference.geometries())
            .to_multi_line_string()
            .buffer(0.45);
        for f in &out.collection {
            if let Geometry::LineString(ls) = &f.geometry {
                for c in &ls.0 {
                    assert!(!blocked.intersects(&geo::Point::from(*c)));
                }
            }
        }
    }
}
