/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 25/09/2026
Last Modified: 17/10/2026
License: MIT
*/

/*!
MapChange Tools is a command-line program for merging changed parcel
outlines into a reference polygon layer. The following commands are
recognized:

| Command           | Description                                                                   |
| ----------------- | ----------------------------------------------------------------------------- |
| --cd, --wd        | Changes the working directory; used in conjunction with --run flag.           |
| -h, --help        | Prints help information.                                                      |
| --listtools       | Lists all available tools. Keywords may also be used, --listtools split.      |
| --max_procs       | Sets the maximum number of worker threads. -1 = default pool size.            |
| -r, --run         | Runs a tool; used in conjunction with --wd flag; -r="ClipBoundaries".         |
| --toolbox         | Prints the toolbox associated with a tool; --toolbox=SplitPolygons.           |
| --toolhelp        | Prints the help associated with a tool; --toolhelp="ExtendLines".             |
| --toolparameters  | Prints the parameters (in json form) for a specific tool.                     |
| -v                | Verbose mode. Without this flag, tool outputs will not be printed.            |
| --version         | Prints the version information.                                               |

*/

use mapchange_common::configs::{get_configs, save_configs};
use mapchange_tools::tools::ToolManager;
use std::env;
use std::io::Error;
use std::path;
use std::process;

fn main() {
    pretty_env_logger::init();
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}

/// Strips a flag name and an optional `=` from an argument, leaving its value.
fn flag_value(arg: &str, names: &[&str]) -> String {
    let mut v = arg.to_string();
    for name in names {
        if let Some(rest) = v.strip_prefix(name) {
            v = rest.to_string();
            break;
        }
    }
    let v = v.replace("\"", "").replace("\'", "");
    match v.strip_prefix('=') {
        Some(rest) => rest.to_string(),
        None => v,
    }
}

fn run() -> Result<(), Error> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut toolbox = false;
    let mut list_tools = false;
    let mut keywords: Vec<String> = vec![];
    let mut tool_args_vec: Vec<String> = vec![];
    let mut finding_working_dir = false;
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        version();
        help();
        let tm = ToolManager::new("", &false)?;
        tm.list_tools();
        return Ok(());
    }

    let mut configs = get_configs()?;
    let mut configs_modified = false;

    for arg in args {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val.starts_with("-cd")
            || flag_val.starts_with("-wd")
            || flag_val.starts_with("-working_directory")
        {
            let mut v = flag_value(
                &arg,
                &["--working_directory", "-working_directory", "--cd", "--wd", "-cd", "-wd"],
            );
            if v.trim().is_empty() {
                finding_working_dir = true;
                continue;
            }
            if !v.ends_with(sep) {
                v.push_str(sep);
            }
            if configs.working_directory != v {
                configs.working_directory = v;
                configs_modified = true;
            }
        } else if flag_val.starts_with("-run") || flag_val.starts_with("-r=") || flag_val == "-r" {
            tool_name = flag_value(&arg, &["--run", "-run", "-r"]);
            run_tool = true;
        } else if flag_val.starts_with("-toolhelp") {
            tool_name = flag_value(&arg, &["--toolhelp", "-toolhelp"]);
            tool_help = true;
        } else if flag_val.starts_with("-toolparameters") {
            tool_name = flag_value(&arg, &["--toolparameters", "-toolparameters"]);
            tool_parameters = true;
        } else if flag_val.starts_with("-toolbox") {
            tool_name = flag_value(&arg, &["--toolbox", "-toolbox"]);
            toolbox = true;
        } else if flag_val.starts_with("-listtools") || flag_val.starts_with("-list_tools") {
            list_tools = true;
        } else if flag_val == "-v" || flag_val.starts_with("-v=") || flag_val.starts_with("-verbose") {
            let v = flag_value(&arg, &["--verbose", "-verbose", "-v"]);
            let verbose = v.to_lowercase().contains('t') || v.is_empty();
            if configs.verbose_mode != verbose {
                configs.verbose_mode = verbose;
                configs_modified = true;
            }
        } else if flag_val.starts_with("-max_procs") {
            let v = flag_value(&arg, &["--max_procs", "-max_procs"]);
            let val = v.trim().parse::<isize>().map_err(|_| {
                Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Error parsing --max_procs value '{}'", v),
                )
            })?;
            if val != configs.max_procs {
                configs.max_procs = val;
                configs_modified = true;
            }
        } else if flag_val.starts_with("-version") {
            version();
            return Ok(());
        } else if arg.starts_with('-') {
            // it's an arg to be fed to the tool
            tool_args_vec.push(arg.trim().to_string());
        } else {
            let value = arg.trim().replace("\"", "").replace("\'", "");
            if finding_working_dir {
                let mut v = value;
                if !v.ends_with(sep) {
                    v.push_str(sep);
                }
                configs.working_directory = v;
                configs_modified = true;
                finding_working_dir = false;
            } else if !tool_args_vec.is_empty() {
                tool_args_vec.push(arg.trim().to_string());
            } else {
                keywords.push(value);
            }
        }
    }

    if configs_modified {
        save_configs(&configs)?;
    }

    let tm = ToolManager::new(&configs.working_directory, &configs.verbose_mode)?;
    if tool_name.is_empty() && !keywords.is_empty() {
        tool_name = keywords[0].clone();
    }
    if run_tool {
        return tm.run_tool(tool_name, tool_args_vec);
    } else if tool_help {
        return tm.tool_help(tool_name);
    } else if tool_parameters {
        return tm.tool_parameters(tool_name);
    } else if toolbox {
        return tm.toolbox(tool_name);
    } else if list_tools {
        if keywords.is_empty() {
            tm.list_tools();
        } else {
            tm.list_tools_with_keywords(keywords);
        }
    }

    Ok(())
}

fn help() {
    let ext = if cfg!(target_os = "windows") { ".exe" } else { "" };
    let exe_name = &format!("mapchange_tools{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = "MapChange Tools Help

The following commands are recognized:
--cd, --wd          Changes the working directory; used in conjunction with --run flag.
-h, --help          Prints help information.
--listtools         Lists all available tools. Keywords may also be used, --listtools split.
--max_procs         Sets the maximum number of worker threads. -1 = default pool size. e.g. --max_procs=4
-r, --run           Runs a tool; used in conjunction with --wd flag; -r=\"ClipBoundaries\".
--toolbox           Prints the toolbox associated with a tool; --toolbox=SplitPolygons.
--toolhelp          Prints the help associated with a tool; --toolhelp=\"ExtendLines\".
--toolparameters    Prints the parameters (in json form) for a specific tool; --toolparameters=\"MergeLines\".
-v                  Verbose mode. Without this flag, tool outputs will not be printed.
--version           Prints the version information.

Example Usage:
>> .*EXE_NAME -r=ChangeMapWorkflow --wd=\"*path*to*data*\" -i=parcels.geojson --reference=basemap.geojson --mode=full -v
"
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "MapChange Tools v{}

Clip, extend and split tools for merging changed parcels into a
reference polygon layer.",
        VERSION.unwrap_or("unknown")
    );
}
