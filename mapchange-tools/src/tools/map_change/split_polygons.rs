/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 28/09/2026
Last Modified: 17/10/2026
License: MIT
*/

use super::required_data_source;
use crate::stages::{split_polygons, SplitOptions};
use crate::tools::*;
use mapchange_common::parallel::{CancelToken, ConsoleProgress};
use mapchange_common::utils::get_formatted_elapsed_time;
use mapchange_vector::{FileStore, GeometryIo};
use std::io::Error;
use std::time::Instant;

/// This tool splits polygons (`--input`) along a set of cutting lines
/// (`--lines`). Cutting lines whose ends meet within `--tolerance` are
/// treated as closed rings and the area they enclose is removed from the
/// polygons. Open lines divide each polygon into the faces they form with its
/// boundary; lines that end inside a polygon without crossing it do not cut.
///
/// Every piece becomes a separate single-part polygon with an `FID` and the
/// `PARENT_FID` of the input polygon it came from. Polygons that no cutting
/// line reaches are written unchanged.
///
/// # See Also
/// `ExtendLines`, `ChangeMapWorkflow`
pub struct SplitPolygons {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl SplitPolygons {
    pub fn new() -> SplitPolygons {
        // public constructor
        let name = "SplitPolygons".to_string();
        let toolbox = "Map Change".to_string();
        let description = "Splits polygons along cutting lines.".to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input Polygons".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input polygon file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Polygon,
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
            name: "Cutting Lines".to_owned(),
            flags: vec!["--lines".to_owned()],
            description: "Input cutting line file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Vector(
                VectorGeometryType::Line,
            )),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Cutting Lines Layer".to_owned(),
            flags: vec!["--lines_layer".to_owned()],
            description: "Cutting lines layer name, for directory data sources.".to_owned(),
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
            name: "Closure Tolerance".to_owned(),
            flags: vec!["--tolerance".to_owned()],
            description: "Maximum gap between the ends of a cutting line treated as a ring.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: Some("0.0001".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(
            &name,
            "-i=basemap.geojson --lines=extended.geojson -o=split.geojson",
        );

        SplitPolygons {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for SplitPolygons {
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
        let lines = required_data_source(&args, &["-lines"], &["-lines_layer"], working_directory)?;
        let output = required_data_source(&args, &["-o", "-output"], &["-output_layer"], working_directory)?;
        let options = SplitOptions {
            closure_tolerance: args.float(&["-tolerance"], SplitOptions::default().closure_tolerance)?,
        };

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let start = Instant::now();
        let store = FileStore::new();
        let polygons = store.load(&input.path, input.layer())?;
        let cutting_lines = store.load(&lines.path, lines.layer())?;

        let progress = ConsoleProgress::new(verbose);
        let out = split_polygons(&polygons, &cutting_lines, &options, &progress, &CancelToken::new())?;

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
