use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelcrop operations.
///
/// Only configuration problems and failures on the source or output root
/// surface as an `Err` from the batch entry points. Per-file problems are
/// recorded in the returned report instead, using [`LabelcropError::kind`]
/// and the Display text.
#[derive(Debug, Error)]
pub enum LabelcropError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read source directory {path}: {source}")]
    SourceDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to parse LabelMe JSON from {path}: {source}")]
    LabelMeParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write LabelMe JSON to {path}: {source}")]
    LabelMeWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid shape in {path}: {message}")]
    InvalidShape { path: PathBuf, message: String },
}

/// Broad error classes used when reporting failures to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad caller input: empty paths, non-positive padding, etc.
    Configuration,
    /// Filesystem or image codec failure.
    Io,
    /// Malformed annotation content.
    Data,
}

impl LabelcropError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabelcropError::InvalidConfig { .. } => ErrorKind::Configuration,
            LabelcropError::Io(_)
            | LabelcropError::SourceDirUnreadable { .. }
            | LabelcropError::OutputDirCreate { .. }
            | LabelcropError::ImageDimensionRead { .. }
            | LabelcropError::ImageDecode { .. }
            | LabelcropError::ImageWrite { .. } => ErrorKind::Io,
            LabelcropError::LabelMeParse { .. }
            | LabelcropError::LabelMeWrite { .. }
            | LabelcropError::InvalidShape { .. } => ErrorKind::Data,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        LabelcropError::InvalidConfig {
            message: message.into(),
        }
    }
}
