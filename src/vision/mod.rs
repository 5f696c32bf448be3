//! Vision Layer
//!
//! The three collaborators of the verification pipeline and the plumbing
//! needed to call them:
//! - region detection (YOLO via ONNX Runtime)
//! - real/fake classification (YOLO-cls via ONNX Runtime)
//! - text extraction (Tesseract) and identity field parsing

pub mod classification;
pub mod detection;
pub mod fields;
pub mod models;
pub mod ocr;
pub mod ocr_preprocess;
pub mod preprocess;

use image::RgbImage;
use thiserror::Error;

pub use classification::{ClassScores, YoloClassifier};
pub use detection::{Region, YoloDetector};
pub use fields::{parse_fields, ExtractedFields, NOT_FOUND};
pub use models::{ModelManager, ModelType, OnnxSession};
pub use ocr::TesseractExtractor;
pub use ocr_preprocess::clean_document;

/// Errors raised by model-backed collaborators
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),
}

/// Finds regions of interest (the card) in a document image
pub trait RegionDetector: Send {
    /// Regions in source pixel coordinates, best first
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Region>, VisionError>;
}

/// Scores an image against the two opposing classes
pub trait DocumentClassifier: Send {
    fn classify(&mut self, image: &RgbImage) -> Result<ClassScores, VisionError>;
}

/// Recognizes the raw text printed on a document
pub trait TextExtractor: Send {
    fn extract_text(&mut self, image: &RgbImage) -> Result<String, VisionError>;
}

/// Crop `image` to `region`, clamped to the image bounds.
///
/// Returns `None` when the clamped region is empty.
pub fn crop_to_region(image: &RgbImage, region: &Region) -> Option<RgbImage> {
    let (x, y, width, height) = region.pixel_bounds(image.width(), image.height())?;
    Some(image::imageops::crop_imm(image, x, y, width, height).to_image())
}
