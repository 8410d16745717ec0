/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 20/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use super::{check_distance, guarded, StageOutput, StageReport};
use geo::{unary_union, Area, BooleanOps, Buffer, Geometry, MultiPolygon, Polygon};
use mapchange_common::algorithms::{polygon_parts, AREA_EPSILON};
use mapchange_common::parallel::ProgressSink;
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::{geometry_type_name, Feature, FeatureCollection};

const STAGE: &str = "Basemap extent";

/// Cuts the reference polygons down to the area within `threshold` of the
/// subject polygons.
///
/// All subject polygons are dissolved and buffered by `threshold`. Every
/// reference polygon is intersected with that zone, keeping its attributes;
/// reference features that fall entirely outside are dropped.
pub fn process_basemap_extent(
    subject: &FeatureCollection,
    reference: &FeatureCollection,
    threshold: f64,
    progress: &dyn ProgressSink,
) -> Result<StageOutput> {
    check_distance("threshold", threshold)?;
    let subject_polys: Vec<Polygon<f64>> = subject.geometries().flat_map(polygon_parts).collect();
    if subject_polys.is_empty() {
        return Err(MapChangeError::stage_failure(STAGE, "the subject contains no polygons"));
    }

    progress.progress(0.0, "Dissolving subject polygons");
    let zone: MultiPolygon<f64> = guarded(0, || unary_union(&subject_polys).buffer(threshold))
        .map_err(|e| MapChangeError::stage_failure(STAGE, e.to_string()))?;

    let mut report = StageReport::new(STAGE);
    let mut output = FeatureCollection::new(reference.crs.clone());
    output.inherit_crs(subject);
    let num_features = reference.len();
    for (i, f) in reference.features.iter().enumerate() {
        let result = clip_to_zone(i + 1, f, &zone);
        report.record(&result);
        if let Ok(Some(clipped)) = result {
            output.push(clipped);
        }
        progress.progress(100.0 * (i + 1) as f64 / num_features as f64, "Clipping reference");
    }
    if num_features == 0 {
        progress.progress(100.0, "Clipping reference");
    }
    report.output_features = output.len();
    log::info!("{}", report);
    Ok(StageOutput {
        collection: output,
        report,
    })
}

fn clip_to_zone(feature: usize, f: &Feature, zone: &MultiPolygon<f64>) -> Result<Option<Feature>> {
    let parts = polygon_parts(&f.geometry);
    if parts.is_empty() {
        return Err(MapChangeError::UnsupportedGeometryType {
            feature,
            expected: "Polygon",
            found: geometry_type_name(&f.geometry).to_string(),
        });
    }
    let clipped = guarded(feature, || MultiPolygon::new(parts).intersection(zone))?;
    let mut kept: Vec<Polygon<f64>> = clipped
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > AREA_EPSILON)
        .collect();
    Ok(match kept.len() {
        0 => None,
        1 => kept
            .pop()
            .map(|p| Feature::with_attributes(Geometry::Polygon(p), f.attributes.clone())),
        _ => Some(Feature::with_attributes(
            Geometry::MultiPolygon(MultiPolygon::new(kept)),
            f.attributes.clone(),
        )),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{line_string, polygon};
    use mapchange_common::parallel::NullProgress;
    use mapchange_vector::FieldData;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0)
        ])
    }

    #[test]
    fn reference_is_cut_to_the_buffered_subject() {
        let subject = FeatureCollection::from_features(
            vec![Feature::new(square(0.0, 0.0, 10.0)), Feature::new(square(10.0, 0.0, 10.0))],
            Some("EPSG:4547".to_string()),
        );
        let mut near = Feature::new(square(15.0, 0.0, 10.0));
        near.set_attribute("DLMC", FieldData::Text("paddy".to_string()));
        let far = Feature::new(square(100.0, 0.0, 10.0));
        let reference = FeatureCollection::from_features(vec![near, far], None);

        let out = process_basemap_extent(&subject, &reference, 1.0, &NullProgress).unwrap();
        assert_eq!(out.collection.len(), 1);
        let f = &out.collection.features[0];
        assert_eq!(f.get_attribute("DLMC"), Some(&FieldData::Text("paddy".to_string())));
        // x from 15 to 21, y from 0 to 10
        let area = match &f.geometry {
            Geometry::Polygon(p) => p.unsigned_area(),
            g => panic!("unexpected geometry {:?}", g),
        };
        assert!((area - 60.0).abs() < 1e-6);
        assert_eq!(out.collection.crs.as_deref(), Some("EPSG:4547"));
        assert_eq!(out.report.succeeded, 2);
    }

    #[test]
    fn subject_without_polygons_fails() {
        let subject = FeatureCollection::from_features(
            vec![Feature::new(Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]))],
            None,
        );
        let reference = FeatureCollection::from_features(vec![Feature::new(square(0.0, 0.0, 1.0))], None);
        assert!(matches!(
            process_basemap_extent(&subject, &reference, 1.0, &NullProgress),
            Err(MapChangeError::PipelineStageFailure { .. })
        ));
    }
}
