/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 12/09/2026
Last Modified: 16/10/2026
License: MIT
*/

mod basemap;
mod clip;
mod extend;
mod prefilter;
mod split;

pub use self::basemap::process_basemap_extent;
pub use self::clip::{clip_boundaries, ClipOptions};
pub use self::extend::{extend_lines, ExtendOptions};
pub use self::prefilter::{filter_candidates, Candidates};
pub use self::split::{split_polygons, SplitOptions};

use geo::{CoordsIter, Geometry};
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::FeatureCollection;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Per-stage counts, reported once when the stage finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub stage: String,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unsupported: usize,
    pub output_features: usize,
}

impl StageReport {
    pub fn new(stage: &str) -> StageReport {
        StageReport {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    /// Counts one per-feature outcome, logging the skipped ones.
    pub(crate) fn record<T>(&mut self, outcome: &Result<T>) {
        self.processed += 1;
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(e @ MapChangeError::UnsupportedGeometryType { .. }) => {
                self.unsupported += 1;
                log::warn!("{}: skipped. {}", self.stage, e);
            }
            Err(e) => {
                self.failed += 1;
                log::warn!("{}: skipped. {}", self.stage, e);
            }
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} features processed, {} succeeded, {} failed, {} unsupported; {} output features",
            self.stage, self.processed, self.succeeded, self.failed, self.unsupported, self.output_features
        )
    }
}

/// A stage's new collection plus its report.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub collection: FeatureCollection,
    pub report: StageReport,
}

pub(crate) fn has_non_finite(geom: &Geometry<f64>) -> bool {
    geom.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite())
}

/// Runs a geometry operation for one feature, turning a panic inside the
/// geometry primitives into a `GeometryOperationFailure` for that feature.
pub(crate) fn guarded<T, F: FnOnce() -> T>(feature: usize, op: F) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "geometry primitive panicked".to_string()
        };
        MapChangeError::GeometryOperationFailure { feature, message }
    })
}

/// Checks that a distance parameter is finite and not negative.
pub(crate) fn check_distance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MapChangeError::InvalidParameter(format!(
            "{} must be a finite, non-negative number (got {})",
            name, value
        )));
    }
    Ok(())
}
