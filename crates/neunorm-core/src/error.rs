//! Error types for the neunorm library

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Shape;

/// Result type alias for neunorm operations
pub type Result<T> = std::result::Result<T, NormalizationError>;

/// Error taxonomy for the normalization pipeline
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// A stage already committed output; loading more raw data is refused
    #[error("operation not allowed as you already worked on this data set")]
    AlreadyProcessed,

    /// Frame dimensions differ within a category or across categories
    #[error("shape of {context} does not match the rest of the data set: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: Shape,
        actual: Shape,
    },

    /// An operation was called on an absent or zero-length array
    #[error("data array is empty")]
    EmptyInput,

    /// Required data has not been loaded
    #[error("missing data: {0}")]
    MissingData(String),

    /// ROI does not satisfy the bounds invariant
    #[error("invalid roi: {0}")]
    InvalidRoi(String),

    /// ROI selection covers zero pixels
    #[error("degenerate roi: selection covers zero pixels")]
    DegenerateRoi,

    /// Sample-only normalization requires at least one ROI
    #[error("at least one roi is required when normalizing without open beam data")]
    MissingRoi,

    /// File extension outside the supported format family
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Path does not resolve to a regular file
    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Export destination directory does not exist
    #[error("output folder does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Unknown data category key
    #[error("invalid data category: {0}")]
    InvalidCategory(String),

    /// A file could not be decoded
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// A file could not be written
    #[error("failed to write {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

impl NormalizationError {
    /// Create a decode error with context
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encode error with context
    pub fn encode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a shape mismatch error for the given category
    pub fn shape_mismatch(context: impl Into<String>, expected: Shape, actual: Shape) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}
