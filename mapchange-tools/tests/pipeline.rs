/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 06/10/2026
Last Modified: 18/10/2026
License: MIT
*/

use geo::{
    line_string, polygon, Area, BooleanOps, Distance, Euclidean, Geometry, LineString, MultiPolygon, Point,
    Polygon,
};
use mapchange_common::algorithms::{linework, merge_lines};
use mapchange_common::parallel::{BatchRunner, CancelToken, NullProgress};
use mapchange_tools::stages::*;
use mapchange_tools::tools::ToolManager;
use mapchange_tools::workflow::{DataSource, Workflow, WorkflowMode, WorkflowOptions};
use mapchange_vector::{Feature, FeatureCollection, FieldData, FileStore, GeometryIo};
use proptest::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
    polygon![
        (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size), (x: x0, y: y0)
    ]
}

fn collection(geoms: Vec<Geometry<f64>>) -> FeatureCollection {
    FeatureCollection::from_features(
        geoms.into_iter().map(Feature::new).collect(),
        Some("EPSG:4547".to_string()),
    )
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mapchange_pipeline_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn area_of(c: &FeatureCollection) -> f64 {
    c.geometries().map(|g| g.unsigned_area()).sum()
}

#[test]
fn touching_segments_merge_into_one_line() {
    let merged = merge_lines(
        &[
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)],
        ],
        6,
    );
    assert_eq!(merged, vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]]);
}

#[test]
fn boundary_inside_the_blocked_zone_is_consumed() {
    let subject = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
    let reference = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
    let options = ClipOptions {
        buffer_distance: 1.0,
        ..Default::default()
    };
    let out = clip_boundaries(
        &subject,
        &reference,
        &options,
        &BatchRunner::default(),
        &NullProgress,
        &CancelToken::new(),
    )
    .unwrap();
    assert!(out.collection.is_empty());
    assert_eq!(out.report.processed, 1);
    assert_eq!(out.report.output_features, 0);
}

#[test]
fn lone_line_extends_by_the_distance() {
    let lines = collection(vec![Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])]);
    let options = ExtendOptions {
        extend_distance: 0.5,
        ..Default::default()
    };
    let out = extend_lines(
        &lines,
        &FeatureCollection::default(),
        &options,
        &BatchRunner::default(),
        &NullProgress,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(
        out.collection.features[0].geometry,
        Geometry::LineString(line_string![
            (x: -0.5, y: 0.0), (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.5, y: 0.0)
        ])
    );
}

#[test]
fn midline_halves_a_square() {
    let polygons = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
    let cutting = collection(vec![Geometry::LineString(line_string![(x: 5.0, y: -1.0), (x: 5.0, y: 11.0)])]);
    let out = split_polygons(&polygons, &cutting, &SplitOptions::default(), &NullProgress, &CancelToken::new()).unwrap();
    assert_eq!(out.collection.len(), 2);
    for f in out.collection.iter() {
        assert!((f.geometry.unsigned_area() - 50.0).abs() < 1e-6);
        assert_eq!(f.get_attribute("PARENT_FID"), Some(&FieldData::Int(1)));
    }
}

#[test]
fn batches_are_reassembled_in_order() {
    let items: Vec<usize> = (0..250).collect();
    let seen = Mutex::new(vec![]);
    let progress = |pct: f64, _msg: &str| seen.lock().unwrap().push(pct);
    let runner = BatchRunner::new(100, 4);
    let outcome = runner.run(&items, |i, v| (i, v * 2), &progress, "Doubling", &CancelToken::new());

    assert_eq!(outcome.num_batches, 3);
    assert_eq!(outcome.batches_completed, 3);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.results.len(), 250);
    assert!(outcome.results.iter().enumerate().all(|(k, &(i, v))| k == i && v == 2 * i));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().copied(), Some(100.0));
}

#[test]
fn cancelled_runs_complete_nothing() {
    let items: Vec<usize> = (0..250).collect();
    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = BatchRunner::new(100, 2).run(&items, |_, v| *v, &NullProgress, "Idle", &cancel);
    assert!(outcome.cancelled);
    assert_eq!(outcome.batches_completed, 0);
}

/// Subject parcels in one GeoJSON file, the base map in another.
fn write_inputs(dir: &PathBuf) -> (DataSource, DataSource) {
    let store = FileStore::new();
    let strip = polygon![(x: 4.0, y: -2.0), (x: 6.0, y: -2.0), (x: 6.0, y: 12.0), (x: 4.0, y: 12.0), (x: 4.0, y: -2.0)];
    let subject = DataSource::new(dir.join("parcels.geojson"), None);
    let reference = DataSource::new(dir.join("basemap.geojson"), None);
    store
        .save(&collection(vec![Geometry::Polygon(strip)]), &subject.path, None)
        .unwrap();
    let mut basemap = collection(vec![
        Geometry::Polygon(square(0.0, 0.0, 10.0)),
        Geometry::Polygon(square(40.0, 40.0, 5.0)),
    ]);
    basemap.features[0].set_attribute("NAME", FieldData::Text("block".to_string()));
    store.save(&basemap, &reference.path, None).unwrap();
    (subject, reference)
}

#[test]
fn full_workflow_writes_split_next_to_the_subject() {
    let dir = scratch_dir("full");
    let (subject, reference) = write_inputs(&dir);
    let store = FileStore::new();
    let workflow = Workflow::new(&store, WorkflowOptions::new(subject, reference));
    let summary = workflow
        .run(WorkflowMode::Full, &NullProgress, &CancelToken::new())
        .unwrap();

    assert_eq!(summary.output.path, dir.join("split_features_b.geojson"));
    assert!(!dir.join("clipped_features.geojson").exists());
    let out = store.load(&summary.output.path, None).unwrap();
    // three pieces of the block plus the untouched far square
    assert_eq!(out.len(), 4);
    assert!((area_of(&out) - 125.0).abs() < 1e-6);
    assert_eq!(out.crs.as_deref(), Some("EPSG:4547"));
}

#[test]
fn single_steps_leave_intermediate_files() {
    let dir = scratch_dir("steps");
    let (subject, reference) = write_inputs(&dir);
    let store = FileStore::new();
    let workflow = Workflow::new(&store, WorkflowOptions::new(subject, reference));
    for mode in ["clip", "extend", "split"] {
        let mode: WorkflowMode = mode.parse().unwrap();
        workflow.run(mode, &NullProgress, &CancelToken::new()).unwrap();
    }
    assert!(dir.join("clipped_features.geojson").is_file());
    assert!(dir.join("extended_features.geojson").is_file());
    let out = store.load(&dir.join("split_features_b.geojson"), None).unwrap();
    assert_eq!(out.len(), 4);
}

#[test]
fn basemap_extent_drops_far_polygons() {
    let dir = scratch_dir("extent");
    let (subject, reference) = write_inputs(&dir);
    let store = FileStore::new();
    let workflow = Workflow::new(&store, WorkflowOptions::new(subject, reference));
    let (target, report) = workflow
        .process_basemap_extent(1.0, None, &NullProgress)
        .unwrap();
    assert_eq!(target.path, dir.join("basemap_extent.geojson"));
    assert_eq!(report.output_features, 1);
    let out = store.load(&target.path, None).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(
        out.features[0].get_attribute("NAME"),
        Some(&FieldData::Text("block".to_string()))
    );
}

#[test]
fn workflow_tool_runs_from_arguments() {
    let dir = scratch_dir("tool");
    write_inputs(&dir);
    let wd = format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR);
    let tm = ToolManager::new(&wd, &false).unwrap();
    tm.run_tool(
        "ChangeMapWorkflow".to_string(),
        vec![
            "-i=parcels.geojson".to_string(),
            "--reference=basemap.geojson".to_string(),
            "--mode=full".to_string(),
            "-o=result.geojson".to_string(),
        ],
    )
    .unwrap();
    assert!(dir.join("result.geojson").is_file());

    let err = tm
        .run_tool("ChangeMapWorkflow".to_string(), vec!["--mode=sideways".to_string()])
        .unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn merge_tool_handles_projected_coordinates() {
    let dir = scratch_dir("merge");
    let (x0, y0) = (39_512_345.0, 3_456_789.0);
    let fragments = collection(vec![
        Geometry::LineString(line_string![(x: x0, y: y0), (x: x0 + 10.0, y: y0)]),
        Geometry::LineString(line_string![(x: x0 + 10.0, y: y0), (x: x0 + 10.0, y: y0 + 4.0)]),
        Geometry::LineString(line_string![(x: x0, y: y0 + 50.0), (x: x0 + 10.0, y: y0 + 50.0)]),
    ]);
    let store = FileStore::new();
    store.save(&fragments, &dir.join("fragments.geojson"), None).unwrap();

    let wd = format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR);
    let tm = ToolManager::new(&wd, &false).unwrap();
    tm.run_tool(
        "MergeLines".to_string(),
        vec![
            "-i=fragments.geojson".to_string(),
            "-o=merged.geojson".to_string(),
            "--precision=12".to_string(),
        ],
    )
    .unwrap();
    let merged = store.load(&dir.join("merged.geojson"), None).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.crs.as_deref(), Some("EPSG:4547"));

    let err = tm
        .run_tool(
            "MergeLines".to_string(),
            vec![
                "-i=fragments.geojson".to_string(),
                "-o=merged.geojson".to_string(),
                "--precision=16".to_string(),
            ],
        )
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

fn clip_result(size: f64, shift: f64, buffer: f64) -> (FeatureCollection, FeatureCollection) {
    let subject = collection(vec![Geometry::Polygon(square(shift, shift, size))]);
    let reference = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
    let options = ClipOptions {
        buffer_distance: buffer,
        ..Default::default()
    };
    let out = clip_boundaries(
        &subject,
        &reference,
        &options,
        &BatchRunner::new(1, 2),
        &NullProgress,
        &CancelToken::new(),
    )
    .unwrap();
    (out.collection, reference)
}

fn line_length(ls: &LineString<f64>) -> f64 {
    ls.lines().map(|l| (l.dx() * l.dx() + l.dy() * l.dy()).sqrt()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn clipped_lines_stay_out_of_the_blocked_zone(shift in 1.0f64..8.0, size in 1.0f64..6.0) {
        let buffer = 0.25;
        let (clipped, reference) = clip_result(size, shift, buffer);
        let reference_lines: Vec<LineString<f64>> = reference.geometries().flat_map(linework).collect();
        for f in clipped.iter() {
            if let Geometry::LineString(ls) = &f.geometry {
                for c in ls.coords() {
                    let p = Point::from(*c);
                    let d = reference_lines
                        .iter()
                        .flat_map(|l| l.lines())
                        .map(|seg| Euclidean.distance(&p, &seg))
                        .fold(f64::INFINITY, f64::min);
                    // buffer arcs are polygonal, so corners sit slightly inside the true offset
                    prop_assert!(d >= 0.95 * buffer);
                }
            }
        }
    }

    #[test]
    fn extension_never_shortens_lines(x0 in -5.0f64..5.0, len in 0.5f64..4.0, d in 0.0f64..2.0) {
        let ls = line_string![(x: x0, y: 1.0), (x: x0 + len, y: 1.0)];
        let reference = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
        let options = ExtendOptions { extend_distance: d, ..Default::default() };
        let out = extend_lines(
            &collection(vec![Geometry::LineString(ls.clone())]),
            &reference,
            &options,
            &BatchRunner::default(),
            &NullProgress,
            &CancelToken::new(),
        ).unwrap();
        match &out.collection.features[0].geometry {
            Geometry::LineString(extended) => prop_assert!(line_length(extended) >= line_length(&ls) - 1e-9),
            g => prop_assert!(false, "unexpected geometry {:?}", g),
        }
    }

    #[test]
    fn split_pieces_cover_the_input(x in 0.5f64..9.5, y in 0.5f64..9.5) {
        let polygons = collection(vec![Geometry::Polygon(square(0.0, 0.0, 10.0))]);
        let cutting = collection(vec![
            Geometry::LineString(line_string![(x: x, y: -1.0), (x: x, y: 11.0)]),
            Geometry::LineString(line_string![(x: -1.0, y: y), (x: 11.0, y: y)]),
        ]);
        let out = split_polygons(&polygons, &cutting, &SplitOptions::default(), &NullProgress, &CancelToken::new()).unwrap();
        prop_assert_eq!(out.collection.len(), 4);
        prop_assert!((area_of(&out.collection) - 100.0).abs() < 1e-6);
        let pieces: Vec<Polygon<f64>> = out
            .collection
            .geometries()
            .filter_map(|g| match g {
                Geometry::Polygon(p) => Some(p.clone()),
                _ => None,
            })
            .collect();
        let rest = MultiPolygon::new(vec![square(0.0, 0.0, 10.0)]).difference(&MultiPolygon::new(pieces));
        prop_assert!(rest.unsigned_area() < 1e-6);
    }
}
