//! Card region detection
//!
//! Runs a YOLOv8 detection model exported to ONNX and decodes its raw
//! `[1, 4 + classes, anchors]` output into pixel-space regions.

use image::RgbImage;
use ort::value::TensorRef;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::models::OnnxSession;
use super::preprocess::preprocess_for_detection;
use super::{RegionDetector, VisionError};
use crate::config::DetectionSettings;

/// A detected region in source image pixels (corner format)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Detector class index
    pub class_id: usize,
}

impl Region {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over Union with another region
    pub fn iou(&self, other: &Region) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Integer (x, y, width, height) clamped to an image, `None` if empty
    pub fn pixel_bounds(&self, img_width: u32, img_height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f32, max: u32| (v.max(0.0) as u32).min(max);

        let x1 = clamp(self.x1, img_width);
        let y1 = clamp(self.y1, img_height);
        let x2 = clamp(self.x2, img_width);
        let y2 = clamp(self.y2, img_height);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

/// Decode a raw YOLOv8 detection tensor.
///
/// `dims` is the output shape, `(scale_x, scale_y)` maps model input pixels
/// back to source pixels. Output is sorted by confidence, NMS applied.
pub fn decode_yolo_output(
    dims: &[usize],
    data: &[f32],
    scale: (f32, f32),
    settings: &DetectionSettings,
) -> Result<Vec<Region>, VisionError> {
    if dims.len() != 3 {
        return Err(VisionError::InvalidOutput(format!(
            "expected 3D detector output, got {}D",
            dims.len()
        )));
    }

    // Exported models emit [1, features, anchors]; some exports transpose it
    let (features, anchors, transposed) = if dims[1] <= dims[2] {
        (dims[1], dims[2], false)
    } else {
        (dims[2], dims[1], true)
    };

    if features < 5 {
        return Err(VisionError::InvalidOutput(format!(
            "detector output has {features} features per anchor, need at least 5"
        )));
    }
    if data.len() < features * anchors {
        return Err(VisionError::InvalidOutput(format!(
            "detector output holds {} values, shape {:?} needs {}",
            data.len(),
            dims,
            features * anchors
        )));
    }

    let get = |feature: usize, anchor: usize| {
        if transposed {
            data[anchor * features + feature]
        } else {
            data[feature * anchors + anchor]
        }
    };

    let num_classes = features - 4;
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = 0.0f32;
        for class_id in 0..num_classes {
            let score = get(4 + class_id, anchor);
            if score > best_score {
                best_score = score;
                best_class = class_id;
            }
        }

        if best_score < settings.confidence_threshold {
            continue;
        }

        let cx = get(0, anchor);
        let cy = get(1, anchor);
        let w = get(2, anchor);
        let h = get(3, anchor);

        candidates.push(Region {
            x1: (cx - w / 2.0) * scale.0,
            y1: (cy - h / 2.0) * scale.1,
            x2: (cx + w / 2.0) * scale.0,
            y2: (cy + h / 2.0) * scale.1,
            confidence: best_score.min(1.0),
            class_id: best_class,
        });
    }

    debug!("Raw detections before NMS: {}", candidates.len());

    Ok(non_maximum_suppression(
        candidates,
        settings.iou_threshold,
        settings.max_detections,
    ))
}

/// Greedy NMS; keeps the highest-confidence region of each overlapping group
pub fn non_maximum_suppression(
    mut regions: Vec<Region>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Region> {
    regions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Region> = Vec::new();
    for region in regions {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == region.class_id && k.iou(&region) > iou_threshold);
        if !suppressed {
            kept.push(region);
        }
    }

    kept
}

/// YOLOv8 detector backed by an ONNX session
pub struct YoloDetector {
    session: OnnxSession,
    settings: DetectionSettings,
}

impl YoloDetector {
    /// Load the detector model
    pub fn new(model_path: &Path, settings: DetectionSettings, use_gpu: bool, threads: usize) -> Result<Self, VisionError> {
        info!("Loading detector model from {:?}", model_path);
        let session = OnnxSession::load(model_path, use_gpu, threads)
            .map_err(|e| VisionError::ModelLoad(format!("{e:#}")))?;
        Ok(Self { session, settings })
    }
}

impl RegionDetector for YoloDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Region>, VisionError> {
        let start = Instant::now();
        let (input, scale) = preprocess_for_detection(image, self.settings.input_size);

        let input_tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .session_mut()
            .run(ort::inputs![input_tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        debug!("Detector output shape: {:?}", dims);

        let regions = decode_yolo_output(&dims, data, scale, &self.settings)?;

        debug!(
            "Detection on {}x{} complete in {:?}: {} regions",
            image.width(),
            image.height(),
            start.elapsed(),
            regions.len()
        );

        Ok(regions)
    }
}
