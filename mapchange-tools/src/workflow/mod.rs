/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 22/09/2026
Last Modified: 17/10/2026
License: MIT
*/

mod orchestrator;

pub use self::orchestrator::Workflow;

use crate::stages::{ClipOptions, ExtendOptions, SplitOptions, StageReport};
use mapchange_common::parallel::BatchRunner;
use mapchange_common::{MapChangeError, Result};
use mapchange_vector::VectorFormat;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CLIPPED_FEATURES: &str = "clipped_features";
pub const EXTENDED_FEATURES: &str = "extended_features";
pub const SPLIT_FEATURES: &str = "split_features_b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clip,
    Extend,
    Split,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Clip => "Clip",
            Stage::Extend => "Extend",
            Stage::Split => "Split",
        }
    }

    /// Name of the data set the stage writes when run on its own.
    pub fn output_name(&self) -> &'static str {
        match self {
            Stage::Clip => CLIPPED_FEATURES,
            Stage::Extend => EXTENDED_FEATURES,
            Stage::Split => SPLIT_FEATURES,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowMode {
    /// One stage, reading the previous stage's saved output.
    SingleStep(Stage),
    /// Clip, extend and split in memory; only the split result is saved.
    Full,
    /// Clip and extend each subject feature on its own, then one split.
    Iterative,
}

impl FromStr for WorkflowMode {
    type Err = MapChangeError;

    fn from_str(s: &str) -> Result<WorkflowMode> {
        match s.trim().to_lowercase().as_str() {
            "full" | "all" => Ok(WorkflowMode::Full),
            "iterative" | "per_feature" => Ok(WorkflowMode::Iterative),
            "clip" | "step1" => Ok(WorkflowMode::SingleStep(Stage::Clip)),
            "extend" | "step2" => Ok(WorkflowMode::SingleStep(Stage::Extend)),
            "split" | "step3" => Ok(WorkflowMode::SingleStep(Stage::Split)),
            other => Err(MapChangeError::InvalidParameter(format!(
                "unrecognized workflow mode '{}'; expected full, iterative, clip, extend or split",
                other
            ))),
        }
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkflowMode::SingleStep(stage) => write!(f, "{} only", stage),
            WorkflowMode::Full => write!(f, "full workflow"),
            WorkflowMode::Iterative => write!(f, "iterative workflow"),
        }
    }
}

/// A data set: a file, or a layer of a multi-layer directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSource {
    pub path: PathBuf,
    pub layer: Option<String>,
}

impl DataSource {
    pub fn new<P: Into<PathBuf>>(path: P, layer: Option<&str>) -> DataSource {
        DataSource {
            path: path.into(),
            layer: layer.filter(|l| !l.trim().is_empty()).map(String::from),
        }
    }

    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn format(&self) -> VectorFormat {
        VectorFormat::from_path(&self.path)
    }

    /// A sibling data set called `name`: a layer `<prefix><name>` in the same
    /// directory source, or a `<name>.<ext>` file next to this one.
    pub fn sibling(&self, name: &str, layer_prefix: &str) -> DataSource {
        match self.format() {
            VectorFormat::Directory => DataSource {
                path: self.path.clone(),
                layer: Some(format!("{}{}", layer_prefix, name)),
            },
            VectorFormat::SingleFile => {
                let ext = self
                    .path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("geojson");
                let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
                DataSource {
                    path: dir.join(format!("{}.{}", name, ext)),
                    layer: None,
                }
            }
        }
    }

    /// The default name of a reduced copy of this data set.
    pub fn extent_variant(&self, layer_prefix: &str) -> DataSource {
        let stem = match (self.format(), self.layer()) {
            (VectorFormat::Directory, Some(layer)) => layer.to_string(),
            _ => self
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("reference")
                .to_string(),
        };
        self.sibling(&format!("{}_extent", stem), layer_prefix)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.layer {
            Some(layer) => write!(f, "{} ({})", self.path.display(), layer),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Inputs, outputs and tunables of a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Polygons whose boundaries are clipped and extended (feature A).
    pub subject: DataSource,
    /// Polygons that block the clip and are finally split (feature B).
    pub reference: DataSource,
    /// Where the split result goes; `split_features_b` next to the subject
    /// when unset.
    pub output: Option<DataSource>,
    /// Prepended to intermediate layer names in directory sources.
    pub layer_prefix: String,
    pub clip: ClipOptions,
    pub extend: ExtendOptions,
    pub split: SplitOptions,
    pub runner: BatchRunner,
}

impl WorkflowOptions {
    pub fn new(subject: DataSource, reference: DataSource) -> WorkflowOptions {
        WorkflowOptions {
            subject,
            reference,
            output: None,
            layer_prefix: String::new(),
            clip: ClipOptions::default(),
            extend: ExtendOptions::default(),
            split: SplitOptions::default(),
            runner: BatchRunner::default(),
        }
    }

    /// Location of a named intermediate data set.
    pub fn intermediate(&self, name: &str) -> DataSource {
        self.subject.sibling(name, &self.layer_prefix)
    }

    /// Location of the final split output.
    pub fn split_output(&self) -> DataSource {
        self.output
            .clone()
            .unwrap_or_else(|| self.intermediate(SPLIT_FEATURES))
    }
}

/// What a workflow run did.
#[derive(Debug, Clone)]
pub struct WorkflowSummary {
    pub mode: WorkflowMode,
    pub reports: Vec<StageReport>,
    pub output: DataSource,
    pub output_features: usize,
}

impl fmt::Display for WorkflowSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} complete: {} features written to {}",
            self.mode, self.output_features, self.output
        )
    }
}
