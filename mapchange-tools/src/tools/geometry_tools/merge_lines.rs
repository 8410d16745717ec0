/*
This tool is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 29/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use crate::tools::*;
use geo::Geometry;
use mapchange_common::algorithms::{merge_geometries, MAX_MERGE_PRECISION};
use mapchange_common::configs::get_configs;
use mapchange_common::utils::{get_formatted_elapsed_time, resolve_path};
use mapchange_vector::{Feature, FeatureCollection, FieldData, FileStore, GeometryIo};
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::time::Instant;

/// This tool joins line fragments that share end points into continuous
/// polylines. End points are matched after rounding to `--precision` decimal
/// places (the `merge_precision` setting by default). Lines only run on
/// through points where exactly two line ends meet, so junctions of three or
/// more lines always end the polylines that meet there.
///
/// The output carries an `FID` attribute only.
pub struct MergeLines {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl MergeLines {
    pub fn new() -> MergeLines {
        // public constructor
        let name = "MergeLines".to_string();
        let toolbox = "Geometry Tools".to_string();
        let description = "Joins touching line fragments into continuous polylines.".to_string();

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
            name: "Precision".to_owned(),
            flags: vec!["--precision".to_owned()],
            description: "Decimal places used to match end points.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some("6".to_owned()),
            optional: true,
        });

        let example_usage = example_usage(&name, "-i=fragments.geojson -o=merged.geojson --precision=6");

        MergeLines {
            name,
            description,
            toolbox,
            parameters,
            example_usage,
        }
    }
}

impl MapChangeTool for MergeLines {
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
        let input_file = resolve_path(working_directory, &args.required_string(&["-i", "-input"])?);
        let output_file = resolve_path(working_directory, &args.required_string(&["-o", "-output"])?);
        let configs = get_configs()?;
        let precision = args.integer(&["-precision"], configs.merge_precision)?;
        if precision > MAX_MERGE_PRECISION {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "The precision must be between 0 and {} decimal places.",
                    MAX_MERGE_PRECISION
                ),
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let start = Instant::now();
        let store = FileStore::new();
        let input = store.load(Path::new(&input_file), None)?;

        let geometries: Vec<Geometry<f64>> = input.geometries().cloned().collect();
        let merged = merge_geometries(&geometries, precision);
        if verbose {
            println!("{} lines merged into {} polylines", input.len(), merged.len());
        }

        let mut output = FeatureCollection::new(input.crs.clone());
        for (i, ls) in merged.into_iter().enumerate() {
            let mut f = Feature::new(Geometry::LineString(ls));
            f.set_attribute("FID", FieldData::Int(i as i64 + 1));
            output.push(f);
        }
        store.save(&output, Path::new(&output_file), None)?;

        let elapsed_time = get_formatted_elapsed_time(start);
        if verbose {
            println!("Output file written");
            println!("{}", &format!("Elapsed Time: {}", elapsed_time));
        }

        Ok(())
    }
}
