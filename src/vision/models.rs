//! Model management for ONNX Runtime
//!
//! Resolves, downloads, verifies and loads the detector and classifier models.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::config::ModelSettings;

/// Environment variable that disables all downloads
pub const OFFLINE_ENV: &str = "AADHAAR_SHIELD_OFFLINE";

/// The two ONNX models the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Card region detector (YOLOv8 detect)
    Detector,
    /// Real/fake classifier (YOLOv8 cls)
    Classifier,
}

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::Detector, ModelType::Classifier];

    /// Default file name inside the models directory
    pub fn filename(&self) -> &'static str {
        match self {
            ModelType::Detector => "detector.onnx",
            ModelType::Classifier => "classifier.onnx",
        }
    }

    /// Display name for progress reporting
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::Detector => "Region Detector",
            ModelType::Classifier => "Real/Fake Classifier",
        }
    }
}

/// Availability of one model file
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_type: ModelType,
    pub path: PathBuf,
    pub available: bool,
    pub size_bytes: Option<u64>,
}

/// Model manifest tracking downloaded models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: Option<String>,
    /// Unix seconds
    pub downloaded_at: String,
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            models: Vec::new(),
        }
    }
}

/// Progress callback for download operations
pub type DownloadProgressCallback = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Resolves model files and keeps the models directory in shape
pub struct ModelManager {
    models_dir: PathBuf,
    settings: ModelSettings,
}

impl ModelManager {
    /// Manager over `<data_dir>/models`
    pub fn new(settings: ModelSettings) -> Result<Self> {
        let data_dir = crate::storage::get_data_dir()?;
        Self::with_dir(data_dir.join("models"), settings)
    }

    /// Manager over a custom directory
    pub fn with_dir(models_dir: PathBuf, settings: ModelSettings) -> Result<Self> {
        std::fs::create_dir_all(&models_dir)
            .with_context(|| format!("Failed to create models directory {:?}", models_dir))?;
        Ok(Self {
            models_dir,
            settings,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Configured path, or the default file inside the models directory
    pub fn model_path(&self, model_type: ModelType) -> PathBuf {
        let configured = match model_type {
            ModelType::Detector => self.settings.detector_path.as_ref(),
            ModelType::Classifier => self.settings.classifier_path.as_ref(),
        };
        configured
            .cloned()
            .unwrap_or_else(|| self.models_dir.join(model_type.filename()))
    }

    fn download_url(&self, model_type: ModelType) -> Option<&str> {
        match model_type {
            ModelType::Detector => self.settings.detector_url.as_deref(),
            ModelType::Classifier => self.settings.classifier_url.as_deref(),
        }
    }

    fn expected_sha256(&self, model_type: ModelType) -> Option<&str> {
        match model_type {
            ModelType::Detector => self.settings.detector_sha256.as_deref(),
            ModelType::Classifier => self.settings.classifier_sha256.as_deref(),
        }
    }

    /// A model is available when its file exists and is not empty
    pub fn is_model_available(&self, model_type: ModelType) -> bool {
        std::fs::metadata(self.model_path(model_type))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    pub fn are_models_ready(&self) -> bool {
        ModelType::ALL.iter().all(|&m| self.is_model_available(m))
    }

    /// Status of every model
    pub fn get_model_status(&self) -> Vec<ModelStatus> {
        ModelType::ALL
            .iter()
            .map(|&model_type| {
                let path = self.model_path(model_type);
                let size_bytes = std::fs::metadata(&path).ok().map(|m| m.len());
                ModelStatus {
                    model_type,
                    available: self.is_model_available(model_type),
                    path,
                    size_bytes,
                }
            })
            .collect()
    }

    /// Path to the model, downloading it first if missing
    pub fn ensure_model(&self, model_type: ModelType) -> Result<PathBuf> {
        let path = self.model_path(model_type);

        if self.is_model_available(model_type) {
            debug!("Model {:?} already available at {:?}", model_type, path);
            return Ok(path);
        }

        info!("Model {:?} missing, downloading...", model_type);
        self.download_model_with_progress(model_type, None)?;

        Ok(path)
    }

    /// Download a specific model with optional progress callback
    pub fn download_model_with_progress(
        &self,
        model_type: ModelType,
        progress: Option<DownloadProgressCallback>,
    ) -> Result<()> {
        let path = self.model_path(model_type);
        let Some(url) = self.download_url(model_type) else {
            anyhow::bail!(
                "No download URL configured for the {} model. Place it at {:?} or set models.{}_url",
                model_type.display_name(),
                path,
                if model_type == ModelType::Detector { "detector" } else { "classifier" }
            );
        };

        if std::env::var(OFFLINE_ENV).is_ok() {
            anyhow::bail!(
                "Offline mode: cannot download models. Please download manually from {} and place at {:?}",
                url,
                path
            );
        }

        info!("Downloading {} model from {}", model_type.display_name(), url);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rt = Runtime::new().context("Failed to create tokio runtime")?;
        rt.block_on(async { self.download_file_async(url, &path, model_type, progress).await })?;

        if !self.is_model_available(model_type) {
            anyhow::bail!("Download completed but model verification failed");
        }

        self.update_manifest_for_model(model_type)?;

        info!("Successfully downloaded {} model", model_type.display_name());
        Ok(())
    }

    async fn download_file_async(
        &self,
        url: &str,
        path: &Path,
        model_type: ModelType,
        progress: Option<DownloadProgressCallback>,
    ) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(url)
            .send()
            .await
            .context("Failed to send download request")?;

        if !response.status().is_success() {
            anyhow::bail!("Download failed with status {}: {}", response.status(), url);
        }

        let total_size = response.content_length();
        debug!("Download size: {:?} bytes", total_size);

        let temp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading download stream")?;
            file.write_all(&chunk).context("Failed to write to temp file")?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(ref callback) = progress {
                callback(downloaded, total_size);
            }
        }

        file.flush().context("Failed to flush temp file")?;
        drop(file);

        let hash = format!("{:x}", hasher.finalize());
        if let Some(expected) = self.expected_sha256(model_type) {
            if !hash.eq_ignore_ascii_case(expected) {
                std::fs::remove_file(&temp_path).ok();
                anyhow::bail!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    model_type.filename(),
                    expected,
                    hash
                );
            }
            info!("Checksum verified for {}", model_type.display_name());
        }

        std::fs::rename(&temp_path, path)
            .context("Failed to move downloaded file to final location")?;

        Ok(())
    }

    /// Record the file hash of a model in the manifest
    pub fn update_manifest_for_model(&self, model_type: ModelType) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_default();

        let path = self.model_path(model_type);
        let data = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let hash = format!("{:x}", Sha256::digest(&data));

        let model_info = ModelInfo {
            model_type: format!("{:?}", model_type),
            filename: model_type.filename().to_string(),
            size_bytes: data.len() as u64,
            sha256: Some(hash),
            downloaded_at: unix_timestamp(),
        };

        if let Some(existing) = manifest
            .models
            .iter_mut()
            .find(|m| m.filename == model_info.filename)
        {
            *existing = model_info;
        } else {
            manifest.models.push(model_info);
        }

        self.save_manifest(&manifest)
    }

    pub fn load_manifest(&self) -> Result<ModelManifest> {
        let manifest_path = self.models_dir.join("manifest.json");
        if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(ModelManifest::default())
        }
    }

    pub fn save_manifest(&self, manifest: &ModelManifest) -> Result<()> {
        let manifest_path = self.models_dir.join("manifest.json");
        std::fs::write(manifest_path, serde_json::to_string_pretty(manifest)?)?;
        Ok(())
    }
}

/// ONNX Runtime session wrapper
pub struct OnnxSession {
    session: Session,
}

impl OnnxSession {
    /// Load a model; with `use_gpu` CUDA is tried before the CPU provider
    pub fn load(model_path: &Path, use_gpu: bool, intra_threads: usize) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("Model file not found: {:?}", model_path);
        }

        info!("Loading ONNX model from {:?}", model_path);

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads.max(1))?;

        let builder = if use_gpu {
            match builder.with_execution_providers([
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ]) {
                Ok(builder) => builder,
                Err(e) => {
                    warn!("GPU execution provider unavailable, using CPU: {}", e);
                    Session::builder()?
                        .with_optimization_level(GraphOptimizationLevel::Level3)?
                        .with_intra_threads(intra_threads.max(1))?
                }
            }
        } else {
            builder
        };

        let session = builder
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model {:?}", model_path))?;

        info!(
            "Model loaded. Inputs: {:?}, Outputs: {:?}",
            session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self { session })
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

fn unix_timestamp() -> String {
    use std::time::SystemTime;

    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}
