// private sub-module defined in other files
mod change_map_workflow;
mod clip_boundaries;
mod extend_lines;
mod process_basemap_extent;
mod split_polygons;

// exports identifiers from private sub-modules in the current module namespace
pub use self::change_map_workflow::ChangeMapWorkflow;
pub use self::clip_boundaries::ClipBoundaries;
pub use self::extend_lines::ExtendLines;
pub use self::process_basemap_extent::ProcessBasemapExtent;
pub use self::split_polygons::SplitPolygons;

use super::ToolArgs;
use crate::workflow::DataSource;
use mapchange_common::utils::resolve_path;
use std::io::Error;

/// A data source given by a path flag and an optional layer flag. Bare file
/// names are resolved against the working directory.
pub(crate) fn data_source(
    args: &ToolArgs,
    path_flags: &[&str],
    layer_flags: &[&str],
    working_directory: &str,
) -> Option<DataSource> {
    args.string(path_flags).map(|p| {
        let layer = args.string(layer_flags);
        DataSource::new(resolve_path(working_directory, &p), layer.as_deref())
    })
}

pub(crate) fn required_data_source(
    args: &ToolArgs,
    path_flags: &[&str],
    layer_flags: &[&str],
    working_directory: &str,
) -> Result<DataSource, Error> {
    let p = args.required_string(path_flags)?;
    let layer = args.string(layer_flags);
    Ok(DataSource::new(resolve_path(working_directory, &p), layer.as_deref()))
}
