//! Application Configuration
//!
//! User settings and model parameters stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Model file locations
    pub models: ModelSettings,
    /// Region detector parameters
    pub detection: DetectionSettings,
    /// Real/fake classifier parameters
    pub classification: ClassificationSettings,
    /// Text extraction settings
    pub ocr: OcrSettings,
    /// REST API settings
    pub server: ServerSettings,
    /// Dashboard settings
    pub dashboard: DashboardSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory receiving uploads, crops and exports
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Where the detector and classifier models come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Explicit detector model path (defaults to `<data_dir>/models/detector.onnx`)
    pub detector_path: Option<PathBuf>,
    /// Explicit classifier model path (defaults to `<data_dir>/models/classifier.onnx`)
    pub classifier_path: Option<PathBuf>,
    /// Download URL for the detector model
    pub detector_url: Option<String>,
    /// Download URL for the classifier model
    pub classifier_url: Option<String>,
    /// Expected SHA-256 of the detector model
    pub detector_sha256: Option<String>,
    /// Expected SHA-256 of the classifier model
    pub classifier_sha256: Option<String>,
    /// Try GPU execution providers before CPU
    pub use_gpu: bool,
    /// Intra-op threads per ONNX session
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            detector_path: None,
            classifier_path: None,
            detector_url: None,
            classifier_url: None,
            detector_sha256: None,
            classifier_sha256: None,
            use_gpu: false,
            intra_threads: 4,
        }
    }
}

/// Region detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Square model input size
    pub input_size: u32,
    /// Minimum box confidence (0.0 - 1.0)
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression (0.0 - 1.0)
    pub iou_threshold: f32,
    /// Maximum number of regions kept after NMS
    pub max_detections: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 10,
        }
    }
}

/// Real/fake classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSettings {
    /// Square model input size
    pub input_size: u32,
    /// Output index of the "fake" class
    pub fake_index: usize,
    /// Output index of the "real" class
    pub real_index: usize,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            input_size: 224,
            // Dataset folders are sorted alphabetically: fake, real
            fake_index: 0,
            real_index: 1,
        }
    }
}

/// Text extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language codes (e.g. "eng", "eng+hin")
    pub language: String,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u32,
    /// Document cleanup applied before recognition
    pub preprocessing: DocumentPreprocessing,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            preprocessing: DocumentPreprocessing::default(),
        }
    }
}

/// Grayscale, blur, adaptive threshold and opening, tuned for scanned cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPreprocessing {
    /// Run the cleanup before OCR
    pub enabled: bool,
    /// Gaussian blur sigma (0 disables the blur)
    pub blur_sigma: f32,
    /// Adaptive threshold block radius (5 = 11x11 neighbourhood)
    pub block_radius: u32,
    /// Subtracted from the local mean before thresholding
    pub threshold_offset: i32,
    /// Morphological opening radius (0 disables)
    pub open_radius: u8,
}

impl Default for DocumentPreprocessing {
    fn default() -> Self {
        Self {
            enabled: false,
            blur_sigma: 0.8,
            block_radius: 5,
            threshold_offset: 2,
            open_radius: 1,
        }
    }
}

/// REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Persisted dashboard view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardViewSetting {
    #[default]
    Home,
    Verify,
    Batch,
    Settings,
    About,
}

/// Dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Verdicts below this confidence are flagged for manual review
    pub confidence_threshold: f32,
    /// View shown at startup
    pub last_view: DashboardViewSetting,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            last_view: DashboardViewSetting::Home,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.general.output_dir, PathBuf::from("outputs"));

        assert!(config.models.detector_path.is_none());
        assert!(config.models.classifier_url.is_none());
        assert!(!config.models.use_gpu);

        assert_eq!(config.detection.input_size, 640);
        assert!((config.detection.confidence_threshold - 0.25).abs() < 0.001);
        assert!((config.detection.iou_threshold - 0.45).abs() < 0.001);

        assert_eq!(config.classification.input_size, 224);
        assert_eq!(config.classification.fake_index, 0);
        assert_eq!(config.classification.real_index, 1);

        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.page_segmentation_mode, 3);
        assert!(!config.ocr.preprocessing.enabled);

        assert_eq!(config.server.port, 8000);
        assert!((config.dashboard.confidence_threshold - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.models.detector_path = Some(PathBuf::from("models/detector.onnx"));
        config.detection.max_detections = 3;
        config.dashboard.last_view = DashboardViewSetting::Batch;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.models.detector_path, config.models.detector_path);
        assert_eq!(parsed.detection.max_detections, 3);
        assert_eq!(parsed.dashboard.last_view, DashboardViewSetting::Batch);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [ocr]
            language = "eng+hin"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.port, 9090);
        assert_eq!(parsed.server.host, "0.0.0.0");
        assert_eq!(parsed.ocr.language, "eng+hin");
        assert_eq!(parsed.ocr.page_segmentation_mode, 3);
        assert_eq!(parsed.detection.input_size, 640);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.general.output_dir = PathBuf::from("/tmp/shield-out");

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.general.output_dir, PathBuf::from("/tmp/shield-out"));
        assert_eq!(loaded.classification.real_index, 1);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
