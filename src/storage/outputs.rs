//! Output directory layout
//!
//! Uploads land in per-surface subdirectories under random names, crops are
//! named after their source image plus a random suffix so two sources with
//! the same stem never share a crop. Nothing here is ever cleaned up.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted as document images
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Root of everything the application writes as a side effect
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Open (and create if needed) an output directory
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh path for a detector crop of `source`: `cropped_<stem>_<uuid>.jpg`
    pub fn crop_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        self.root
            .join(format!("cropped_{stem}_{}.jpg", uuid::Uuid::new_v4().simple()))
    }

    /// Path for an exported file (CSV reports etc.)
    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Persist uploaded bytes under `<root>/<subdir>/<uuid><ext>`
    pub fn save_upload(
        &self,
        subdir: &str,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> io::Result<PathBuf> {
        let dir = self.root.join(subdir);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            upload_extension(original_name)
        ));
        std::fs::write(&path, bytes)?;

        debug!("Saved upload ({} bytes) to {:?}", bytes.len(), path);
        Ok(path)
    }
}

/// Extension (with dot) taken from an uploaded file name, `.jpg` when absent
pub fn upload_extension(original_name: Option<&str>) -> String {
    original_name
        .map(Path::new)
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_else(|| ".jpg".to_string())
}

/// Whether a path looks like a supported document image
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported images directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();
    images.sort();
    Ok(images)
}
