/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 27/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::required_data_source;
use crate::stages::{extend_lines, ExtendOptions};
use crate::tools::*;
use mapchange_common::configs::get_configs;
use mapchange_common::parallel::{BatchRunner, CancelToken, ConsoleProgress};
use mapchange_common::utils::get_formatted_elapsed_time;
use mapchange_vector::{FileStore, GeometryIo};
use std::io::Error;
use std::time::Instant;

/// This tool lengthens both ends of every input line (`--input`) so that it
/// reaches across the nearest boundary of a set of reference polygons
/// (`--reference`). Each end is pushed outward along the direction of its end
/// segment until it crosses a thin zone (`--boundary_buffer`) around the
/// reference boundaries, and then by a further `--distance`. Ends whose
/// direction never meets a reference boundary are extended by `--distance`
/// only. Closed lines are left as they are.
///
/// Line attributes are preserved.
///
/// # See Also
/// `ClipBoundaries`, `SplitPolygons`
pub struct ExtendLines {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ExtendLines {
    pub fn new() -> ExtendLines {
        // public constructor
        let name = "ExtendLines".to_string();
        let toolbox = "Map Change".to_string();
        let description = "Extends line ends across the nearest reference polygon boundary.".to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input Lines".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input vector line file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Input Layer".to_owned(),
            flags: vec!["--input_layer".to_owned()],
            description: "Input layer name, for directory data sources.".to_owned(),
            parameter_type: ParameterType::String,
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Reference Polygons".to_owned(),
            flags: vec!["--reference".to_owned()],
            description: "Input reference polygon file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Any,
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
            name: "Output Lines".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output vector line file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
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
            name: "Extension Distance".to_owned(),
            flags: vec!["--distance".to_owned()],
            description: "Distance each end is pushed past the boundary it meets.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.1".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Boundary Buffer".to_owned(),
            flags: vec!["--boundary_buffer".to_owned()],
            description: "Half-width of the zone around the reference boundaries.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.001".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(
            &name,
            "-i=clipped.geojson --reference=basemap.geojson -o=extended.geojson --distance=0.2",
        );

        ExtendLines {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for ExtendLines {
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
        let input = required_data_source(&args, &["-i", "-input"], &["-input_layer"], working_directory)?;
        let reference = required_data_source(&args, &["-reference"], &["-reference_layer"], working_directory)?;
        let output = required_data_source(&args, &["-o", "-output"], &["-output_layer"], working_directory)?;
        let defaults = ExtendOptions::default();
        let options = ExtendOptions {
            extend_distance: args.float(&["-distance", "-extend_distance"], defaults.extend_distance)?,
            boundary_buffer: args.float(&["-boundary_buffer"], defaults.boundary_buffer)?,
        };

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let start = Instant::now();
        let store = FileStore::new();
        let lines = store.load(&input.path, input.layer())?;
        let reference = store.load(&reference.path, reference.layer())?;

        let configs = get_configs()?;
        let progress = ConsoleProgress::new(verbose);
        let out = extend_lines(
            &lines,
            &reference,
            &options,
            &BatchRunner::from_configs(&configs),
            &progress,
            &CancelToken::new(),
        )?;

        if verbose {
            println!("Saving data...")
        };
        store.save(&out.collection, &output.path, output.layer())?;

        let elapsed_time = get_formatted_elapsed_time(start);
        if verbose {
            println!("{}", out.report);
            println!("{}", &format!("Elapsed Time: {}", elapsed_time));
        }

        Ok(())
    }
}
