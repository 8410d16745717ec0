// private sub-module defined in other files
mod merge_lines;

// exports identifiers from private sub-modules in the current module namespace
pub use self::merge_lines::MergeLines;
