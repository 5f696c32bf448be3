//! Real/fake document classification
//!
//! YOLOv8-cls exported to ONNX. The model emits one score per class in
//! `[1, classes]`; only the fake and real entries are read.

use image::RgbImage;
use ort::value::TensorRef;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::models::OnnxSession;
use super::preprocess::preprocess_for_classification;
use super::{DocumentClassifier, VisionError};
use crate::config::ClassificationSettings;

/// Scores for the two opposing classes, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub fake: f32,
    pub real: f32,
}

/// Pick the fake/real scores out of a raw classifier output.
///
/// Logits are passed through softmax; outputs that already form a
/// probability distribution are taken as-is.
pub fn scores_from_output(
    raw: &[f32],
    fake_index: usize,
    real_index: usize,
) -> Result<ClassScores, VisionError> {
    let needed = fake_index.max(real_index) + 1;
    if raw.len() < needed {
        return Err(VisionError::InvalidOutput(format!(
            "classifier produced {} scores, need at least {}",
            raw.len(),
            needed
        )));
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(VisionError::InvalidOutput(
            "classifier produced non-finite scores".to_string(),
        ));
    }

    let probs = if is_distribution(raw) {
        raw.to_vec()
    } else {
        softmax(raw)
    };

    Ok(ClassScores {
        fake: probs[fake_index].clamp(0.0, 1.0),
        real: probs[real_index].clamp(0.0, 1.0),
    })
}

fn is_distribution(values: &[f32]) -> bool {
    let sum: f32 = values.iter().sum();
    values.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() < 1e-3
}

fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// YOLOv8 classifier backed by an ONNX session
pub struct YoloClassifier {
    session: OnnxSession,
    settings: ClassificationSettings,
}

impl YoloClassifier {
    pub fn new(
        model_path: &Path,
        settings: ClassificationSettings,
        use_gpu: bool,
        threads: usize,
    ) -> Result<Self, VisionError> {
        info!("Loading classifier model from {:?}", model_path);
        let session = OnnxSession::load(model_path, use_gpu, threads)
            .map_err(|e| VisionError::ModelLoad(format!("{e:#}")))?;
        Ok(Self { session, settings })
    }
}

impl DocumentClassifier for YoloClassifier {
    fn classify(&mut self, image: &RgbImage) -> Result<ClassScores, VisionError> {
        let start = Instant::now();
        let input = preprocess_for_classification(image, self.settings.input_size);

        let input_tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .session_mut()
            .run(ort::inputs![input_tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        debug!("Classifier output shape: {:?}", shape);

        let scores = scores_from_output(data, self.settings.fake_index, self.settings.real_index)?;

        debug!(
            "Classification complete in {:?}: fake={:.3} real={:.3}",
            start.elapsed(),
            scores.fake,
            scores.real
        );

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilities_taken_as_is() {
        let scores = scores_from_output(&[0.2, 0.8], 0, 1).unwrap();
        assert!((scores.fake - 0.2).abs() < 1e-6);
        assert!((scores.real - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_logits_get_softmax() {
        let scores = scores_from_output(&[2.0, 0.0], 0, 1).unwrap();
        assert!((scores.fake + scores.real - 1.0).abs() < 1e-5);
        assert!(scores.fake > 0.85 && scores.fake < 0.9);
    }

    #[test]
    fn test_swapped_indices() {
        let scores = scores_from_output(&[0.3, 0.7], 1, 0).unwrap();
        assert!((scores.fake - 0.7).abs() < 1e-6);
        assert!((scores.real - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_scores() {
        assert!(scores_from_output(&[1.0], 0, 1).is_err());
        assert!(scores_from_output(&[], 0, 1).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(scores_from_output(&[f32::NAN, 0.5], 0, 1).is_err());
    }
}
