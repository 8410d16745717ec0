/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 13/09/2026
Last Modified: 02/10/2026
License: MIT
*/

use geo::Intersects;
use mapchange_common::structures::BoundingBox;
use mapchange_vector::{Feature, FeatureCollection};

/// Reference features selected for the exact geometry work of a stage.
pub struct Candidates<'a> {
    pub features: Vec<&'a Feature>,
    /// True when the window matched nothing and every feature was kept.
    pub fell_back: bool,
}

/// Keeps the features of `reference` that touch `window` grown by `margin`.
///
/// The coarse box test is followed by an exact intersects test against the
/// window rectangle. An empty window, or a window that selects nothing, keeps
/// the whole reference set.
pub fn filter_candidates<'a>(
    reference: &'a FeatureCollection,
    window: Option<BoundingBox>,
    margin: f64,
) -> Candidates<'a> {
    let all = || Candidates {
        features: reference.features.iter().collect(),
        fell_back: true,
    };
    let window = match window {
        Some(w) => w.expanded(margin),
        None => return all(),
    };
    let window_poly = window.to_polygon();
    let features: Vec<&Feature> = reference
        .features
        .iter()
        .filter(|f| match BoundingBox::from_geometry(&f.geometry) {
            Some(bb) => bb.overlaps(window) && f.geometry.intersects(&window_poly),
            None => false,
        })
        .collect();
    if features.is_empty() {
        log::debug!("pre-filter selected no reference features; using all {}", reference.len());
        return all();
    }
    Candidates {
        features,
        fell_back: false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{polygon, Geometry};

    fn square(x0: f64, y0: f64, size: f64) -> Feature {
        Feature::new(Geometry::Polygon(polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0)
        ]))
    }

    #[test]
    fn distant_features_are_dropped() {
        let reference = FeatureCollection::from_features(
            vec![square(0.0, 0.0, 1.0), square(100.0, 100.0, 1.0), square(3.0, 0.0, 1.0)],
            None,
        );
        let window = Some(BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        let c = filter_candidates(&reference, window, 0.5);
        assert_eq!(c.features.len(), 1);
        assert!(!c.fell_back);
        let c = filter_candidates(&reference, window, 2.0);
        assert_eq!(c.features.len(), 2);
    }

    #[test]
    fn empty_selection_falls_back_to_everything() {
        let reference = FeatureCollection::from_features(vec![square(100.0, 100.0, 1.0)], None);
        let c = filter_candidates(&reference, Some(BoundingBox::new(0.0, 1.0, 0.0, 1.0)), 0.1);
        assert!(c.fell_back);
        assert_eq!(c.features.len(), 1);
        let c = filter_candidates(&reference, None, 0.1);
        assert!(c.fell_back);
    }
}
