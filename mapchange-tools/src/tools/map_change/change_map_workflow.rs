/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 30/09/2026
Last Modified: 17/10/2026
License: MIT
*/

use super::{data_source, required_data_source};
use crate::tools::*;
use crate::workflow::{Workflow, WorkflowMode, WorkflowOptions};
use mapchange_common::configs::get_configs;
use mapchange_common::parallel::{BatchRunner, CancelToken, ConsoleProgress};
use mapchange_common::utils::get_formatted_elapsed_time;
use mapchange_vector::FileStore;
use std::io::{Error, ErrorKind};
use std::time::Instant;

/// This tool runs the map change workflow, which updates a reference polygon
/// layer (`--reference`) with the outlines of a set of changed subject
/// polygons (`--subject`):
///
/// 1. Clip: subject boundaries near reference boundaries are removed.
/// 2. Extend: the remaining boundary lines are extended across the reference
///    boundaries they approach.
/// 3. Split: the reference polygons are cut along the extended lines.
///
/// `--mode=full` runs the three stages in memory and saves only the split
/// polygons. `--mode=iterative` clips and extends every subject polygon on
/// its own before a single split. `--mode=clip`, `extend` or `split` runs one
/// stage, reading and writing the intermediate data sets `clipped_features`,
/// `extended_features` and `split_features_b` next to the subject. In
/// directory (`*.gdb`) data sources these are layers, prefixed with
/// `--prefix`.
///
/// # See Also
/// `ClipBoundaries`, `ExtendLines`, `SplitPolygons`, `ProcessBasemapExtent`
pub struct ChangeMapWorkflow {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ChangeMapWorkflow {
    pub fn new() -> ChangeMapWorkflow {
        // public constructor
        let name = "ChangeMapWorkflow".to_string();
        let toolbox = "Map Change".to_string();
        let description =
            "Clips, extends and splits to merge changed parcels into a reference layer.".to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Subject Polygons".to_owned(),
            flags: vec!["-i".to_owned(), "--subject".to_owned()],
            description: "Input subject polygon file or directory.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Subject Layer".to_owned(),
            flags: vec!["--subject_layer".to_owned()],
            description: "Subject layer name, for directory data sources.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Reference Polygons".to_owned(),
            flags: vec!["--reference".to_owned()],
            description: "Input reference polygon file or directory.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Reference Layer".to_owned(),
            flags: vec!["--reference_layer".to_owned()],
            description: "Reference layer name, for directory data sources.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Mode".to_owned(),
            flags: vec!["--mode".to_owned()],
            description: "Workflow mode.".to_owned(),
            parameter_type: ParameterType::OptionList(vec![
                "full".to_owned(),
                "iterative".to_owned(),
                "clip".to_owned(),
                "extend".to_owned(),
                "split".to_owned(),
            ]),
            default_value: Some("full".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Output Polygons".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output file for the split polygons; split_features_b next to the subject when unset.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
            )),
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Output Layer".to_owned(),
            flags: vec!["--output_layer".to_owned()],
            description: "Output layer name, for directory data sources.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Layer Prefix".to_owned(),
            flags: vec!["--prefix".to_owned()],
            description: "Prefix of intermediate layer names in directory data sources.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Buffer Distance".to_owned(),
            flags: vec!["--buffer".to_owned()],
            description: "Width of the blocked zone used by the clip stage.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.1".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Extension Distance".to_owned(),
            flags: vec!["--distance".to_owned()],
            description: "Distance line ends are pushed past a reference boundary.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.1".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Closure Tolerance".to_owned(),
            flags: vec!["--tolerance".to_owned()],
            description: "Maximum gap between line ends treated as a closed ring.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.0001".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(
            &name,
            "-i=change.gdb --subject_layer=parcels --reference=change.gdb --reference_layer=basemap --mode=iterative --prefix=run1_",
        );

        ChangeMapWorkflow {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for ChangeMapWorkflow {
    fn get_source_file(&self) -> String {
        String::from(file!())
    }

    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        parameters_json(&self.parameters)
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(&self, args: Vec<String>, working_directory: &'a str, verbose: bool) -> Result<(), Error> {
        let args = ToolArgs::parse(&args)?;
        let subject = required_data_source(&args, &["-i", "-subject"], &["-subject_layer"], working_directory)?;
        let reference = required_data_source(&args, &["-reference"], &["-reference_layer"], working_directory)?;
        let mode: WorkflowMode = args
            .string(&["-mode"])
            .unwrap_or_else(|| "full".to_string())
            .parse()?;

        let configs = get_configs()?;
        let mut options = WorkflowOptions::new(subject, reference);
        options.output = data_source(&args, &["-o", "-output"], &["-output_layer"], working_directory);
        options.layer_prefix = args.string(&["-prefix", "-layer_prefix"]).unwrap_or_default();
        options.clip.buffer_distance = args.float(&["-buffer"], options.clip.buffer_distance)?;
        options.clip.merge_precision = configs.merge_precision;
        options.extend.extend_distance = args.float(&["-distance"], options.extend.extend_distance)?;
        options.split.closure_tolerance = args.float(&["-tolerance"], options.split.closure_tolerance)?;
        options.runner = BatchRunner::from_configs(&configs);

        if verbose {
            print_welcome(&self.get_tool_name());
            println!("Mode: {}", mode);
        }

        let start = Instant::now();
        let store = FileStore::new();
        let workflow = Workflow::new(&store, options);
        let progress = ConsoleProgress::new(verbose);
        let summary = workflow.run(mode, &progress, &CancelToken::new()).map_err(|e| {
            Error::new(
                ErrorKind::Other,
                format!("Workflow failed. {}", e),
            )
        })?;

        let elapsed_time = get_formatted_elapsed_time(start);
        if verbose {
            for report in &summary.reports {
                println!("{}", report);
            }
            println!("{}", summary);
            println!("{}", &format!("Elapsed Time: {}", elapsed_time));
        }

        Ok(())
    }
}
