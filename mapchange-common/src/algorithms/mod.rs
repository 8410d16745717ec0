/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 04/09/2026
Last Modified: 13/10/2026
License: MIT
*/
// private sub-module defined in other files
mod line_extend;
mod line_merge;
mod noding;
mod poly_ops;
mod polygonize;

// exports identifiers from private sub-modules in the current module namespace
pub use self::line_extend::{
    end_directions, extend_geometry, extend_line_string, ExtensionBoundary,
    EXTEND_CLOSURE_TOLERANCE, RAY_LENGTH,
};
pub use self::line_merge::{
    merge_geometries, merge_lines, node_key, NodeKey, DEFAULT_MERGE_PRECISION, MAX_MERGE_PRECISION,
};
pub use self::noding::{LineNetwork, NODE_PRECISION};
pub use self::poly_ops::{
    boundary_lines, is_closed_within, linework, make_valid, polygon_boundary, polygon_parts,
    ring_to_polygon, total_area, AREA_EPSILON,
};
pub use self::polygonize::polygonize;
