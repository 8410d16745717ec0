/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 12/09/2026
Last Modified: 16/10/2026
License: MIT
*/

/*!
Polygon boundary clipping, line extension and polygon splitting for map change
editing. The three stages can be run one at a time against persisted
intermediates, back to back in memory, or iteratively per subject feature.
*/

pub mod stages;
pub mod tools;
pub mod workflow;
