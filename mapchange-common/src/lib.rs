/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 02/09/2026
Last Modified: 18/10/2026
License: MIT
*/

pub mod algorithms;
pub mod configs;
pub mod error;
pub mod parallel;
pub mod structures;
pub mod utils;

pub use error::{MapChangeError, Result};
