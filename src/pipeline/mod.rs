//! Document Verification Pipeline
//!
//! `FraudEngine` runs detector, classifier and text extraction over one
//! image and merges their outputs. The classifier sees the detected crop;
//! text extraction always sees the full image. Any collaborator failure
//! fails the whole prediction.

pub mod batch;
pub mod error;
pub mod extraction;
pub mod result;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::storage::OutputDir;
use crate::vision::{
    crop_to_region, parse_fields, DocumentClassifier, ModelManager, ModelType, RegionDetector,
    TesseractExtractor, TextExtractor, YoloClassifier, YoloDetector,
};

pub use batch::{BatchItem, BatchRow, BatchStatus, BatchSummary};
pub use error::PipelineError;
pub use result::{CombinedResult, FraudVerdict, Label};

/// The loaded pipeline; build once and reuse for every prediction
pub struct FraudEngine {
    detector: Box<dyn RegionDetector>,
    classifier: Box<dyn DocumentClassifier>,
    extractor: Box<dyn TextExtractor>,
    outputs: OutputDir,
}

impl FraudEngine {
    pub fn new(
        detector: Box<dyn RegionDetector>,
        classifier: Box<dyn DocumentClassifier>,
        extractor: Box<dyn TextExtractor>,
        outputs: OutputDir,
    ) -> Self {
        Self {
            detector,
            classifier,
            extractor,
            outputs,
        }
    }

    /// Load both models and Tesseract as configured
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let start = Instant::now();
        let models = ModelManager::new(config.models.clone())?;

        let detector_path = models
            .ensure_model(ModelType::Detector)
            .context("Detector model unavailable")?;
        let classifier_path = models
            .ensure_model(ModelType::Classifier)
            .context("Classifier model unavailable")?;

        let threads = config.models.intra_threads;
        let use_gpu = config.models.use_gpu;

        let detector = YoloDetector::new(&detector_path, config.detection.clone(), use_gpu, threads)?;
        let classifier =
            YoloClassifier::new(&classifier_path, config.classification.clone(), use_gpu, threads)?;
        let extractor = TesseractExtractor::new(config.ocr.clone())?;

        let outputs = OutputDir::new(&config.general.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {:?}",
                config.general.output_dir
            )
        })?;

        info!("Fraud engine ready in {:?}", start.elapsed());

        Ok(Self::new(
            Box::new(detector),
            Box::new(classifier),
            Box::new(extractor),
            outputs,
        ))
    }

    pub fn outputs(&self) -> &OutputDir {
        &self.outputs
    }

    /// Run the full pipeline on one image
    pub fn predict(&mut self, image_path: &Path) -> Result<CombinedResult, PipelineError> {
        let start = Instant::now();

        if !image_path.is_file() {
            return Err(PipelineError::NotFound(image_path.to_path_buf()));
        }

        let image = image::open(image_path)
            .map_err(|source| PipelineError::Decode {
                path: image_path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let regions = self
            .detector
            .detect(&image)
            .map_err(PipelineError::Detection)?;
        debug!("{} regions detected in {:?}", regions.len(), image_path);

        let region = regions.first().copied();
        let crop = region.and_then(|r| {
            let crop = crop_to_region(&image, &r);
            if crop.is_none() {
                warn!("Detected region {:?} is empty after clamping, using full image", r);
            }
            crop
        });

        let (crop_path, region) = match &crop {
            Some(cropped) => {
                let crop_path = self.outputs.crop_path(image_path);
                cropped
                    .save(&crop_path)
                    .map_err(|source| PipelineError::SaveCrop {
                        path: crop_path.clone(),
                        source,
                    })?;
                (crop_path, region)
            }
            None => (image_path.to_path_buf(), None),
        };

        let scores = self
            .classifier
            .classify(crop.as_ref().unwrap_or(&image))
            .map_err(PipelineError::Classification)?;
        let fraud = FraudVerdict::from_scores(scores);

        let text = self
            .extractor
            .extract_text(&image)
            .map_err(PipelineError::Extraction)?;
        let filename = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ocr = parse_fields(&filename, &text);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "{}: {} ({:.1}%) in {}ms",
            filename,
            fraud.label,
            fraud.confidence * 100.0,
            processing_time_ms
        );

        Ok(CombinedResult {
            image_path: image_path.to_path_buf(),
            crop_path,
            fraud,
            ocr,
            region,
            processing_time_ms,
        })
    }

    /// Predict every path in order; failures become error items
    pub fn predict_batch(&mut self, paths: &[PathBuf]) -> Vec<BatchItem> {
        info!("Batch of {} images", paths.len());

        paths
            .iter()
            .map(|path| {
                let outcome = self.predict(path).map_err(|e| {
                    warn!("Prediction failed for {:?}: {}", path, e);
                    e.to_string()
                });
                BatchItem::new(path, outcome)
            })
            .collect()
    }
}
