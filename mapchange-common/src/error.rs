/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 02/09/2026
Last Modified: 11/10/2026
License: MIT
*/

use thiserror::Error;

/// Errors raised by the clip, extend and split pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum MapChangeError {
    /// A required file, directory or layer could not be resolved.
    #[error("Input not found: {0}")]
    InputNotFound(String),

    /// A feature carried a geometry the stage cannot handle. The feature is
    /// skipped and counted; the stage carries on.
    #[error("Unsupported geometry type for feature {feature}: expected {expected}, found {found}")]
    UnsupportedGeometryType {
        feature: usize,
        expected: &'static str,
        found: String,
    },

    /// A geometry primitive failed on one feature.
    #[error("Geometry operation failed on feature {feature}: {message}")]
    GeometryOperationFailure { feature: usize, message: String },

    /// An unrecoverable condition that aborts a whole stage.
    #[error("{stage} stage failed: {message}")]
    PipelineStageFailure { stage: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed content in an input data source.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapChangeError>;

impl MapChangeError {
    pub fn stage_failure<S: Into<String>, M: Into<String>>(stage: S, message: M) -> Self {
        MapChangeError::PipelineStageFailure {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl From<MapChangeError> for std::io::Error {
    fn from(err: MapChangeError) -> std::io::Error {
        use std::io::ErrorKind;
        match err {
            MapChangeError::Io(e) => e,
            MapChangeError::InputNotFound(_) => std::io::Error::new(ErrorKind::NotFound, err.to_string()),
            MapChangeError::InvalidParameter(_)
            | MapChangeError::InvalidData(_)
            | MapChangeError::UnsupportedGeometryType { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err.to_string())
            }
            MapChangeError::Cancelled => std::io::Error::new(ErrorKind::Interrupted, err.to_string()),
            _ => std::io::Error::new(ErrorKind::Other, err.to_string()),
        }
    }
}
