/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 23/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use super::{DataSource, Stage, WorkflowMode, WorkflowOptions, WorkflowSummary};
use crate::stages::{
    clip_boundaries, extend_lines, process_basemap_extent, split_polygons, StageOutput, StageReport,
};
use mapchange_common::parallel::{CancelToken, NullProgress, ProgressSink};
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::{FeatureCollection, GeometryIo};

/// Runs the clip, extend and split stages against a geometry store.
///
/// The stages only ever move forward: clip output feeds extend, extend output
/// cuts the reference polygons. Loading happens before a stage starts and
/// saving after it ends.
pub struct Workflow<'a> {
    io: &'a dyn GeometryIo,
    options: WorkflowOptions,
}

impl<'a> Workflow<'a> {
    pub fn new(io: &'a dyn GeometryIo, options: WorkflowOptions) -> Workflow<'a> {
        Workflow { io, options }
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    pub fn run(
        &self,
        mode: WorkflowMode,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<WorkflowSummary> {
        log::info!("starting {}", mode);
        let summary = match mode {
            WorkflowMode::SingleStep(stage) => self.run_single_step(stage, progress, cancel),
            WorkflowMode::Full => self.run_full(progress, cancel),
            WorkflowMode::Iterative => self.run_iterative(progress, cancel),
        }?;
        log::info!("{}", summary);
        Ok(summary)
    }

    fn load(&self, source: &DataSource) -> Result<FeatureCollection> {
        self.io.load(&source.path, source.layer())
    }

    fn save(&self, collection: &FeatureCollection, target: &DataSource) -> Result<()> {
        self.io.save(collection, &target.path, target.layer())
    }

    fn run_single_step(
        &self,
        stage: Stage,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<WorkflowSummary> {
        let opts = &self.options;
        let reference = self.load(&opts.reference)?;
        let (output, target) = match stage {
            Stage::Clip => {
                let subject = self.load(&opts.subject)?;
                let out = clip_boundaries(&subject, &reference, &opts.clip, &opts.runner, progress, cancel)?;
                (out, opts.intermediate(stage.output_name()))
            }
            Stage::Extend => {
                let clipped = self.load(&opts.intermediate(Stage::Clip.output_name()))?;
                let out = extend_lines(&clipped, &reference, &opts.extend, &opts.runner, progress, cancel)?;
                (out, opts.intermediate(stage.output_name()))
            }
            Stage::Split => {
                let extended = self.load(&opts.intermediate(Stage::Extend.output_name()))?;
                let out = split_polygons(&reference, &extended, &opts.split, progress, cancel)?;
                (out, opts.split_output())
            }
        };
        self.save(&output.collection, &target)?;
        Ok(WorkflowSummary {
            mode: WorkflowMode::SingleStep(stage),
            output_features: output.collection.len(),
            reports: vec![output.report],
            output: target,
        })
    }

    fn run_full(&self, progress: &dyn ProgressSink, cancel: &CancelToken) -> Result<WorkflowSummary> {
        let opts = &self.options;
        let subject = self.load(&opts.subject)?;
        let reference = self.load(&opts.reference)?;

        let clipped = clip_boundaries(&subject, &reference, &opts.clip, &opts.runner, progress, cancel)
            .map_err(|e| consolidate(Stage::Clip, e))?;
        let extended = extend_lines(
            &clipped.collection,
            &reference,
            &opts.extend,
            &opts.runner,
            progress,
            cancel,
        )
        .map_err(|e| consolidate(Stage::Extend, e))?;
        let split = split_polygons(&reference, &extended.collection, &opts.split, progress, cancel)
            .map_err(|e| consolidate(Stage::Split, e))?;

        self.finish(WorkflowMode::Full, vec![clipped.report, extended.report], split)
    }

    fn run_iterative(&self, progress: &dyn ProgressSink, cancel: &CancelToken) -> Result<WorkflowSummary> {
        let opts = &self.options;
        let subject = self.load(&opts.subject)?;
        let reference = self.load(&opts.reference)?;

        let mut clip_report = StageReport::new(Stage::Clip.name());
        let mut extend_report = StageReport::new(Stage::Extend.name());
        let mut pooled = FeatureCollection::new(subject.crs.clone());
        pooled.inherit_crs(&reference);
        let num_features = subject.len();
        for i in 0..num_features {
            if cancel.is_cancelled() {
                return Err(MapChangeError::Cancelled);
            }
            let single = subject.single(i);
            let clipped = clip_boundaries(&single, &reference, &opts.clip, &opts.runner, &NullProgress, cancel)
                .map_err(|e| consolidate(Stage::Clip, e))?;
            let extended = extend_lines(
                &clipped.collection,
                &reference,
                &opts.extend,
                &opts.runner,
                &NullProgress,
                cancel,
            )
            .map_err(|e| consolidate(Stage::Extend, e))?;
            accumulate(&mut clip_report, &clipped.report);
            accumulate(&mut extend_report, &extended.report);
            pooled.features.extend(extended.collection.features);
            progress.progress(
                100.0 * (i + 1) as f64 / num_features as f64,
                "Clipping and extending features",
            );
        }
        log::debug!("{} extended lines pooled from {} subject features", pooled.len(), num_features);

        let split = split_polygons(&reference, &pooled, &opts.split, progress, cancel)
            .map_err(|e| consolidate(Stage::Split, e))?;
        self.finish(WorkflowMode::Iterative, vec![clip_report, extend_report], split)
    }

    fn finish(
        &self,
        mode: WorkflowMode,
        mut reports: Vec<StageReport>,
        split: StageOutput,
    ) -> Result<WorkflowSummary> {
        let target = self.options.split_output();
        self.save(&split.collection, &target)?;
        reports.push(split.report);
        Ok(WorkflowSummary {
            mode,
            reports,
            output_features: split.collection.len(),
            output: target,
        })
    }

    /// Clips the reference polygons to the buffered extent of the subject and
    /// saves them as a new reference data set, `<reference>_extent` by default.
    pub fn process_basemap_extent(
        &self,
        threshold: f64,
        output: Option<DataSource>,
        progress: &dyn ProgressSink,
    ) -> Result<(DataSource, StageReport)> {
        let opts = &self.options;
        let subject = self.load(&opts.subject)?;
        let reference = self.load(&opts.reference)?;
        let out = process_basemap_extent(&subject, &reference, threshold, progress)?;
        let target = output.unwrap_or_else(|| opts.reference.extent_variant(&opts.layer_prefix));
        self.save(&out.collection, &target)?;
        log::info!("{} reference features written to {}", out.collection.len(), target);
        Ok((target, out.report))
    }
}

/// Reports any stage error as a failure of that stage, keeping the original
/// message. Cancellation passes through untouched.
fn consolidate(stage: Stage, err: MapChangeError) -> MapChangeError {
    match err {
        MapChangeError::Cancelled => MapChangeError::Cancelled,
        e @ MapChangeError::PipelineStageFailure { .. } => e,
        e => MapChangeError::stage_failure(stage.name(), e.to_string()),
    }
}

fn accumulate(total: &mut StageReport, part: &StageReport) {
    total.processed += part.processed;
    total.succeeded += part.succeeded;
    total.failed += part.failed;
    total.unsupported += part.unsupported;
    total.output_features += part.output_features;
}
