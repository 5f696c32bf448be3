//! Pipeline errors

use std::path::PathBuf;
use thiserror::Error;

use crate::vision::VisionError;

/// Why a single prediction failed
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Region detection failed: {0}")]
    Detection(#[source] VisionError),

    #[error("Classification failed: {0}")]
    Classification(#[source] VisionError),

    #[error("Text extraction failed: {0}")]
    Extraction(#[source] VisionError),

    #[error("Failed to write crop to {path}: {source}")]
    SaveCrop {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Bad input rather than a failing collaborator
    pub fn is_input_error(&self) -> bool {
        matches!(self, PipelineError::NotFound(_) | PipelineError::Decode { .. })
    }
}
