/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 10/09/2026
Last Modified: 10/10/2026
License: MIT
*/
// private sub-module defined in other files
mod batch_runner;
mod progress;

// exports identifiers from private sub-modules in the current module namespace
pub use self::batch_runner::{default_max_workers, BatchOutcome, BatchRunner, DEFAULT_BATCH_SIZE};
pub use self::progress::{CancelToken, ConsoleProgress, NullProgress, ProgressCounter, ProgressSink};
