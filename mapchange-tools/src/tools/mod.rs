/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 25/09/2026
Last Modified: 17/10/2026
License: MIT
*/

pub mod geometry_tools;
pub mod map_change;

use serde::{Deserialize, Serialize};
use std::env;
use std::io::{Error, ErrorKind};
use std::path;

pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(working_directory: &'a str, verbose_mode: &'a bool) -> Result<ToolManager, Error> {
        let mut tool_names = vec![];
        // geometry_tools
        tool_names.push("MergeLines".to_string());

        // map_change
        tool_names.push("ChangeMapWorkflow".to_string());
        tool_names.push("ClipBoundaries".to_string());
        tool_names.push("ExtendLines".to_string());
        tool_names.push("ProcessBasemapExtent".to_string());
        tool_names.push("SplitPolygons".to_string());

        let tm = ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names,
        };
        Ok(tm)
    }

    fn get_tool(&self, tool_name: &str) -> Option<Box<dyn MapChangeTool + 'static>> {
        match tool_name.to_lowercase().replace("_", "").as_ref() {
            // geometry_tools
            "mergelines" => Some(Box::new(geometry_tools::MergeLines::new())),

            // map_change
            "changemapworkflow" => Some(Box::new(map_change::ChangeMapWorkflow::new())),
            "clipboundaries" => Some(Box::new(map_change::ClipBoundaries::new())),
            "extendlines" => Some(Box::new(map_change::ExtendLines::new())),
            "processbasemapextent" => Some(Box::new(map_change::ProcessBasemapExtent::new())),
            "splitpolygons" => Some(Box::new(map_change::SplitPolygons::new())),

            _ => None,
        }
    }

    fn unrecognized(tool_name: &str) -> Error {
        Error::new(
            ErrorKind::NotFound,
            format!("Unrecognized tool name {}.", tool_name),
        )
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => tool.run(args, &self.working_dir, self.verbose),
            None => Err(ToolManager::unrecognized(&tool_name)),
        }
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", get_help(tool)),
                None => return Err(ToolManager::unrecognized(&tool_name)),
            }
        } else {
            for (i, val) in self.tool_names.iter().enumerate() {
                if let Some(tool) = self.get_tool(val) {
                    println!("{}. {}\n", i + 1, get_help(tool));
                }
            }
        }
        Ok(())
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_tool_parameters()),
            None => return Err(ToolManager::unrecognized(&tool_name)),
        }
        Ok(())
    }

    pub fn toolbox(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", tool.get_toolbox()),
                None => return Err(ToolManager::unrecognized(&tool_name)),
            }
        } else {
            let mut tool_details: Vec<(String, String)> = self
                .tool_names
                .iter()
                .filter_map(|val| self.get_tool(val))
                .map(|tool| (tool.get_tool_name(), tool.get_toolbox()))
                .collect();
            tool_details.sort();
            for (name, toolbox) in &tool_details {
                println!("{}: {}", name, toolbox);
            }
        }
        Ok(())
    }

    pub fn list_tools(&self) {
        let mut tool_details: Vec<(String, String)> = self
            .tool_names
            .iter()
            .filter_map(|val| self.get_tool(val))
            .map(get_name_and_description)
            .collect();
        tool_details.sort();

        let mut ret = format!("All {} Available Tools:\n", tool_details.len());
        for (name, description) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", name, description));
        }
        println!("{}", ret);
    }

    pub fn list_tools_with_keywords(&self, keywords: Vec<String>) {
        let mut tool_details: Vec<(String, String)> = vec![];
        for val in &self.tool_names {
            let tool = match self.get_tool(val) {
                Some(t) => t,
                None => continue,
            };
            let toolbox = tool.get_toolbox().to_lowercase();
            let (nm, des) = get_name_and_description(tool);
            let matched = keywords.iter().any(|kw| {
                let kw = kw.to_lowercase();
                nm.to_lowercase().contains(&kw) || des.to_lowercase().contains(&kw) || toolbox.contains(&kw)
            });
            if matched {
                tool_details.push((nm, des));
            }
        }

        let mut ret = format!("All {} Tools containing keywords:\n", tool_details.len());
        for (name, description) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", name, description));
        }
        println!("{}", ret);
    }

    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }
}

pub trait MapChangeTool {
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn get_source_file(&self) -> String;
    fn run<'a>(&self, args: Vec<String>, working_directory: &'a str, verbose: bool) -> Result<(), Error>;
}

fn get_help<'a>(wt: Box<dyn MapChangeTool + 'a>) -> String {
    let tool_name = wt.get_tool_name();
    let description = wt.get_tool_description();
    let parameters = wt.get_tool_parameters();
    let toolbox = wt.get_toolbox();
    let o: serde_json::Value = serde_json::from_str(&parameters).unwrap_or(serde_json::Value::Null);
    let mut p = String::new();
    p.push_str("Flag               Description\n");
    p.push_str("-----------------  -----------\n");
    if let Some(a) = o["parameters"].as_array() {
        for d in a {
            let mut s = String::new();
            for f in d["flags"].as_array().into_iter().flatten() {
                s.push_str(&format!("{}, ", f.as_str().unwrap_or("")));
            }
            p.push_str(&format!(
                "{:width$} {}\n",
                s.trim().trim_matches(','),
                d["description"].as_str().unwrap_or(""),
                width = 18
            ));
        }
    }
    let example = wt.get_example_usage();
    if example.len() <= 1 {
        format!(
            "{}

Description:\n{}
Toolbox: {}
Parameters:\n
{}
",
            tool_name, description, toolbox, p
        )
    } else {
        format!(
            "{}
Description:\n{}
Toolbox: {}
Parameters:\n
{}

Example usage:
{}
",
            tool_name, description, toolbox, p, example
        )
    }
}

fn get_name_and_description<'a>(wt: Box<dyn MapChangeTool + 'a>) -> (String, String) {
    (wt.get_tool_name(), wt.get_tool_description())
}

/// The parameters of a tool as a `{"parameters": [...]}` JSON document.
pub(crate) fn parameters_json(parameters: &[ToolParameter]) -> String {
    let list: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
    format!("{{\"parameters\": [{}]}}", list.join(","))
}

/// Example command line for a tool, with `*` standing for the path separator.
pub(crate) fn example_usage(tool_name: &str, flags: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let mut short_exe = String::from("mapchange_tools");
    if let Ok(e) = env::current_exe() {
        if let Some(name) = e.file_stem().and_then(|s| s.to_str()) {
            short_exe = name.to_string();
        }
        if e.extension().map_or(false, |x| x == "exe") {
            short_exe += ".exe";
        }
    }
    format!(
        ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" {2}",
        short_exe, tool_name, flags
    )
    .replace("*", &sep)
}

/// Prints the banner shown at the start of a verbose tool run.
pub(crate) fn print_welcome(tool_name: &str) {
    let welcome_len = format!("* Welcome to {} *", tool_name).len().max(30);
    // 30 = length of the 'Powered by' statement.
    println!("{}", "*".repeat(welcome_len));
    println!("* Welcome to {} {}*", tool_name, " ".repeat(welcome_len - 15 - tool_name.len()));
    println!("* Powered by MapChange Tools {}*", " ".repeat(welcome_len - 30));
    println!("{}", "*".repeat(welcome_len));
}

/// Tool arguments as `(flag, value)` pairs. Flags are lower-cased with a
/// single leading dash; values may follow an `=` or come as the next argument.
pub(crate) struct ToolArgs {
    pairs: Vec<(String, Option<String>)>,
}

impl ToolArgs {
    pub fn parse(args: &[String]) -> Result<ToolArgs, Error> {
        if args.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        let mut pairs = vec![];
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].replace("\"", "").replace("\'", "");
            if !arg.starts_with('-') {
                i += 1;
                continue;
            }
            let mut parts = arg.splitn(2, '='); // in case an equals sign was used
            let flag = parts.next().unwrap_or("").to_lowercase().replace("--", "-");
            let value = match parts.next() {
                Some(v) => Some(v.to_string()),
                None if i + 1 < args.len() && !args[i + 1].starts_with('-') => {
                    i += 1;
                    Some(args[i].replace("\"", "").replace("\'", ""))
                }
                None => None,
            };
            pairs.push((flag, value));
            i += 1;
        }
        Ok(ToolArgs { pairs })
    }

    fn find(&self, flags: &[&str]) -> Option<&(String, Option<String>)> {
        self.pairs.iter().rev().find(|(f, _)| flags.contains(&f.as_str()))
    }

    pub fn is_set(&self, flags: &[&str]) -> bool {
        self.find(flags).is_some()
    }

    pub fn string(&self, flags: &[&str]) -> Option<String> {
        self.find(flags)
            .and_then(|(_, v)| v.clone())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn required_string(&self, flags: &[&str]) -> Result<String, Error> {
        self.string(flags).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("The {} parameter is required.", flags[flags.len() - 1]),
            )
        })
    }

    pub fn float(&self, flags: &[&str], default: f64) -> Result<f64, Error> {
        match self.string(flags) {
            Some(v) => v.trim().parse::<f64>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing {} value '{}'", flags[flags.len() - 1], v),
                )
            }),
            None => Ok(default),
        }
    }

    pub fn integer(&self, flags: &[&str], default: u32) -> Result<u32, Error> {
        match self.string(flags) {
            Some(v) => v.trim().parse::<u32>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing {} value '{}'", flags[flags.len() - 1], v),
                )
            }),
            None => Ok(default),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct ToolParameter {
    pub name: String,
    pub flags: Vec<String>,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: Option<String>,
    pub optional: bool,
}

impl ToolParameter {
    pub fn to_string(&self) -> String {
        match serde_json::to_string(&self) {
            Ok(json_str) => json_str,
            Err(err) => format!("{:?}", err),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum ParameterType {
    Boolean,
    String,
    Integer,
    Float,
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
    OptionList(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum ParameterFileType {
    Any,
    Vector(VectorGeometryType),
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum VectorGeometryType {
    Any,
    Line,
    Polygon,
}
