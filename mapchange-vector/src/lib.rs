/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 03/09/2026
Last Modified: 08/10/2026
License: MIT
*/

// private sub-module defined in other files
mod feature;
pub mod geojson;
mod io;

// exports identifiers from private sub-modules in the current module namespace
pub use crate::feature::{geometry_type_name, Feature, FeatureCollection, FieldData};
pub use crate::io::{layer_file, FileStore, GeometryIo, MemoryStore, VectorFormat};
