/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 26/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::required_data_source;
use crate::stages::{clip_boundaries, ClipOptions};
use crate::tools::*;
use mapchange_common::configs::get_configs;
use mapchange_common::parallel::{BatchRunner, CancelToken, ConsoleProgress};
use mapchange_common::utils::get_formatted_elapsed_time;
use mapchange_vector::{FileStore, GeometryIo};
use std::io::Error;
use std::time::Instant;

/// This tool removes the parts of the boundaries of a set of subject polygons
/// (`--subject`) that run within a buffer distance (`--buffer`) of the
/// boundaries of a set of reference polygons (`--reference`). What remains of
/// the subject boundaries is merged into maximal polylines and written to the
/// output file as lines, each with an `FID` attribute. Subject attributes are
/// not carried over.
///
/// The subject and reference data sets may be GeoJSON files or directories
/// (`*.gdb`) of GeoJSON layers; for the latter the layer is selected with
/// `--subject_layer`, `--reference_layer` and `--output_layer`.
///
/// # See Also
/// `ExtendLines`, `SplitPolygons`, `ChangeMapWorkflow`
pub struct ClipBoundaries {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl ClipBoundaries {
    pub fn new() -> ClipBoundaries {
        // public constructor
        let name = "ClipBoundaries".to_string();
        let toolbox = "Map Change".to_string();
        let description =
            "Removes subject polygon boundaries lying near reference polygon boundaries.".to_string();

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
            name: "Buffer Distance".to_owned(),
            flags: vec!["--buffer".to_owned()],
            description: "Width of the blocked zone around the reference boundaries.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.1".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(
            &name,
            "-i=parcels.geojson --reference=basemap.geojson -o=clipped.geojson --buffer=0.5",
        );

        ClipBoundaries {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for ClipBoundaries {
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
        // read the arguments
        let args = ToolArgs::parse(&args)?;
        let subject = required_data_source(&args, &["-i", "-subject", "-input"], &["-subject_layer"], working_directory)?;
        let reference = required_data_source(&args, &["-reference"], &["-reference_layer"], working_directory)?;
        let output = required_data_source(&args, &["-o", "-output"], &["-output_layer"], working_directory)?;
        let configs = get_configs()?;
        let options = ClipOptions {
            buffer_distance: args.float(&["-buffer", "-buffer_distance"], ClipOptions::default().buffer_distance)?,
            merge_precision: configs.merge_precision,
        };

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let start = Instant::now();
        let store = FileStore::new();
        if verbose {
            println!("Reading data...")
        };
        let subject = store.load(&subject.path, subject.layer())?;
        let reference = store.load(&reference.path, reference.layer())?;

        let progress = ConsoleProgress::new(verbose);
        let out = clip_boundaries(
            &subject,
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
            println!("Output file written");
            println!("{}", &format!("Elapsed Time: {}", elapsed_time));
        }

        Ok(())
    }
}
