/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 15/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::prefilter::filter_candidates;
use super::{check_distance, guarded, has_non_finite, StageOutput, StageReport};
use geo::{Buffer, LineString};
use mapchange_common::algorithms::{extend_geometry, linework, ExtensionBoundary, LineNetwork};
use mapchange_common::parallel::{BatchRunner, CancelToken, ProgressSink};
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::{geometry_type_name, Feature, FeatureCollection};

const STAGE: &str = "Extend";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendOptions {
    /// Distance each line end is pushed past the boundary it meets.
    pub extend_distance: f64,
    /// Half-width of the zone built around the reference linework.
    pub boundary_buffer: f64,
}

impl Default for ExtendOptions {
    fn default() -> ExtendOptions {
        ExtendOptions {
            extend_distance: 0.1,
            boundary_buffer: 0.001,
        }
    }
}

/// Extends both ends of every line until it crosses the reference boundary.
///
/// Each end is cast outward along its last segment; when the ray meets the
/// zone around the reference linework the end is moved to the first crossing
/// plus `extend_distance`, otherwise by `extend_distance` alone. Closed lines
/// are kept as they are. Attributes of the input lines are carried over.
pub fn extend_lines(
    lines: &FeatureCollection,
    reference: &FeatureCollection,
    options: &ExtendOptions,
    runner: &BatchRunner,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<StageOutput> {
    check_distance("extend distance", options.extend_distance)?;
    check_distance("boundary buffer", options.boundary_buffer)?;

    let candidates = filter_candidates(reference, lines.bounding_box(), 2.0 * options.extend_distance);
    let reference_lines: Vec<LineString<f64>> = candidates
        .features
        .iter()
        .flat_map(|f| linework(&f.geometry))
        .collect();
    let boundary = if reference_lines.is_empty() {
        log::debug!("{}: no reference linework, lines are extended by distance only", STAGE);
        None
    } else {
        progress.progress(0.0, "Building extension boundary");
        let network = LineNetwork::from_lines(reference_lines.iter());
        Some(ExtensionBoundary::new(
            network.to_multi_line_string().buffer(options.boundary_buffer),
        ))
    };

    let outcome = runner.run(
        &lines.features,
        |i, f| extend_feature(i + 1, f, boundary.as_ref(), options.extend_distance),
        progress,
        "Extending lines",
        cancel,
    );
    if outcome.cancelled {
        return Err(MapChangeError::Cancelled);
    }

    let mut report = StageReport::new(STAGE);
    let mut output = FeatureCollection::new(lines.crs.clone());
    output.inherit_crs(reference);
    for result in outcome.results {
        report.record(&result);
        if let Ok(f) = result {
            output.push(f);
        }
    }
    report.output_features = output.len();
    log::info!("{}", report);
    Ok(StageOutput {
        collection: output,
        report,
    })
}

fn extend_feature(
    feature: usize,
    f: &Feature,
    boundary: Option<&ExtensionBoundary>,
    extend_distance: f64,
) -> Result<Feature> {
    if has_non_finite(&f.geometry) {
        return Err(MapChangeError::GeometryOperationFailure {
            feature,
            message: "non-finite coordinate".to_string(),
        });
    }
    let geometry = guarded(feature, || extend_geometry(&f.geometry, boundary, extend_distance))?
        .ok_or_else(|| MapChangeError::UnsupportedGeometryType {
            feature,
            expected: "LineString",
            found: geometry_type_name(&f.geometry).to_string(),
        })?;
    Ok(Feature::with_attributes(geometry, f.attributes.clone()))
}
