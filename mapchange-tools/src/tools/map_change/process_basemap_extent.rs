/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 01/10/2026
Last Modified: 14/10/2026
License: MIT
*/

use super::{data_source, required_data_source};
use crate::tools::*;
use crate::workflow::{Workflow, WorkflowOptions};
use mapchange_common::parallel::ConsoleProgress;
use mapchange_common::utils::get_formatted_elapsed_time;
use mapchange_vector::FileStore;
use std::io::Error;
use std::time::Instant;

/// This tool reduces a reference polygon layer (`--reference`) to the
/// neighbourhood of a set of subject polygons (`--subject`). The subject
/// polygons are dissolved and buffered by `--threshold`, and every reference
/// polygon is cut to that zone. Reference polygons outside the zone are
/// dropped; the others keep their attributes.
///
/// The result is written to `--output`, or next to the reference as
/// `<reference>_extent` when no output is given.
pub struct ProcessBasemapExtent {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ProcessBasemapExtent {
    pub fn new() -> ProcessBasemapExtent {
        // public constructor
        let name = "ProcessBasemapExtent".to_string();
        let toolbox = "Map Change".to_string();
        let description = "Clips reference polygons to a buffer around the subject polygons.".to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Subject Polygons".to_owned(),
            flags: vec!["-i".to_owned(), "--subject".to_owned()],
            description: "Input subject polygon file.".to_owned(),
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
            description: "Input reference polygon file.".to_owned(),
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
            name: "Output Polygons".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output polygon file.".to_owned(),
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
            name: "Threshold".to_owned(),
            flags: vec!["--threshold".to_owned()],
            description: "Buffer distance around the subject polygons.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("100.0".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(
            &name,
            "-i=parcels.geojson --reference=basemap.geojson --threshold=50.0",
        );

        ProcessBasemapExtent {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for ProcessBasemapExtent {
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
        let output = data_source(&args, &["-o", "-output"], &["-output_layer"], working_directory);
        let threshold = args.float(&["-threshold"], 100.0)?;

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let start = Instant::now();
        let store = FileStore::new();
        let workflow = Workflow::new(&store, WorkflowOptions::new(subject, reference));
        let progress = ConsoleProgress::new(verbose);
        let (target, report) = workflow.process_basemap_extent(threshold, output, &progress)?;

        let elapsed_time = get_formatted_elapsed_time(start);
        if verbose {
            println!("{}", report);
            println!("Output written to {}", target);
            println!("{}", &format!("Elapsed Time: {}", elapsed_time));
        }

        Ok(())
    }
}
