//! OCR (Optical Character Recognition) module
//!
//! Uses Tesseract through leptess to read the raw text of a document.

use image::{DynamicImage, ImageFormat, RgbImage};
use leptess::{LepTess, Variable};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info};

use super::ocr_preprocess::clean_document;
use super::{TextExtractor, VisionError};
use crate::config::OcrSettings;

/// Tesseract-backed text extractor
pub struct TesseractExtractor {
    settings: OcrSettings,
}

impl TesseractExtractor {
    /// Check that Tesseract can start with the configured language
    pub fn new(settings: OcrSettings) -> Result<Self, VisionError> {
        LepTess::new(None, &settings.language).map_err(|e| {
            VisionError::ModelLoad(format!(
                "Failed to initialize Tesseract with language '{}': {}. \
                 Make sure the tessdata for it is installed",
                settings.language, e
            ))
        })?;

        info!(
            "Tesseract ready (language={}, psm={})",
            settings.language, settings.page_segmentation_mode
        );
        Ok(Self { settings })
    }

    /// Grayscale (and optionally cleaned) PNG bytes handed to Tesseract
    fn encode_input(&self, image: &RgbImage) -> Result<Vec<u8>, VisionError> {
        let gray = DynamicImage::ImageRgb8(image.clone()).to_luma8();
        let gray = if self.settings.preprocessing.enabled {
            clean_document(&gray, &self.settings.preprocessing)
        } else {
            gray
        };

        let mut png = Cursor::new(Vec::new());
        gray.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&mut self, image: &RgbImage) -> Result<String, VisionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::Ocr(format!(
                "image dimensions must be non-zero (got {width}x{height})"
            )));
        }

        let start = Instant::now();

        // LepTess handles are not Send, so one is created per call
        let mut lt = LepTess::new(None, &self.settings.language)
            .map_err(|e| VisionError::Ocr(format!("Failed to initialize Tesseract: {e}")))?;

        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.settings.page_segmentation_mode.to_string(),
        )
        .map_err(|e| VisionError::Ocr(format!("Failed to set page segmentation mode: {e}")))?;

        let png = self.encode_input(image)?;
        lt.set_image_from_mem(&png)
            .map_err(|e| VisionError::Ocr(format!("Failed to set image from memory: {e}")))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| VisionError::Ocr(format!("Failed to read recognized text: {e}")))?;

        debug!(
            "OCR on {}x{} complete in {:?}: {} chars",
            width,
            height,
            start.elapsed(),
            text.len()
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentPreprocessing;
    use image::Rgb;

    fn extractor(preprocessing: DocumentPreprocessing) -> TesseractExtractor {
        // Bypasses `new` so no tessdata is needed
        TesseractExtractor {
            settings: OcrSettings {
                preprocessing,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_encode_input_is_grayscale_png() {
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 10, 10]));
        let png = extractor(DocumentPreprocessing::default())
            .encode_input(&img)
            .unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_encode_input_applies_cleanup_when_enabled() {
        let img = RgbImage::from_pixel(16, 16, Rgb([180, 180, 180]));
        let png = extractor(DocumentPreprocessing {
            enabled: true,
            ..Default::default()
        })
        .encode_input(&img)
        .unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut ocr = extractor(DocumentPreprocessing::default());
        assert!(ocr.extract_text(&RgbImage::new(0, 0)).is_err());
    }
}
