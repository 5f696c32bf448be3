//! Document cleanup before OCR
//!
//! Grayscale scans are blurred, binarized against a Gaussian-weighted local
//! mean and opened to drop speckle. Used as an optional OCR pre-pass and by
//! the `preprocess` command over whole directories.

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DocumentPreprocessing;
use crate::storage::outputs::list_images;

/// Sigma of the Gaussian window matching an odd block of `2r + 1` pixels
fn block_sigma(block_radius: u32) -> f32 {
    let ksize = (2 * block_radius + 1) as f32;
    (0.3 * ((ksize - 1.0) * 0.5 - 1.0) + 0.8).max(0.5)
}

/// Binarize against the Gaussian-weighted neighbourhood mean minus `offset`
fn gaussian_adaptive_threshold(image: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur_f32(image, block_sigma(block_radius));

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = i32::from(image.get_pixel(x, y)[0]);
        let threshold = i32::from(local_mean.get_pixel(x, y)[0]) - offset;
        if value > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Run the full cleanup chain on a grayscale document
pub fn clean_document(gray: &GrayImage, settings: &DocumentPreprocessing) -> GrayImage {
    debug!(
        "Cleaning {}x{} document: blur={}, block={}, offset={}, open={}",
        gray.width(),
        gray.height(),
        settings.blur_sigma,
        settings.block_radius,
        settings.threshold_offset,
        settings.open_radius
    );

    let blurred = if settings.blur_sigma > 0.0 {
        gaussian_blur_f32(gray, settings.blur_sigma)
    } else {
        gray.clone()
    };

    let binary = gaussian_adaptive_threshold(&blurred, settings.block_radius, settings.threshold_offset);

    if settings.open_radius > 0 {
        morphology::open(&binary, Norm::LInf, settings.open_radius)
    } else {
        binary
    }
}

/// Clean every image in `input_dir` into `output_dir`, keeping file names.
///
/// Files that fail to decode are skipped. Returns the number written.
pub fn preprocess_directory(
    input_dir: &Path,
    output_dir: &Path,
    settings: &DocumentPreprocessing,
) -> Result<usize> {
    let images = list_images(input_dir)
        .with_context(|| format!("Failed to read input directory {:?}", input_dir))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let mut written = 0;
    for path in images {
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping {:?}, not a valid image: {}", path, e);
                continue;
            }
        };

        let Some(file_name) = path.file_name() else {
            continue;
        };
        let out_path = output_dir.join(file_name);

        clean_document(&image.to_luma8(), settings)
            .save(&out_path)
            .with_context(|| format!("Failed to write {:?}", out_path))?;

        debug!("Processed and saved: {:?}", out_path);
        written += 1;
    }

    info!("Preprocessed {} images into {:?}", written, output_dir);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Light page with a dark 10x10 block in the middle
    fn page_with_block() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            if (15..25).contains(&x) && (15..25).contains(&y) {
                Luma([30])
            } else {
                Luma([220])
            }
        })
    }

    #[test]
    fn test_block_sigma_matches_11x11_window() {
        assert!((block_sigma(5) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_clean_document_is_binary() {
        let cleaned = clean_document(&page_with_block(), &DocumentPreprocessing::default());

        assert_eq!(cleaned.dimensions(), (40, 40));
        assert!(cleaned.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_clean_document_keeps_uniform_background_white() {
        let flat = GrayImage::from_pixel(20, 20, Luma([200]));
        let cleaned = clean_document(&flat, &DocumentPreprocessing::default());
        assert!(cleaned.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_clean_document_marks_block_edges_dark() {
        let cleaned = clean_document(&page_with_block(), &DocumentPreprocessing::default());

        // Just inside the block the local mean is pulled up by the background
        assert_eq!(cleaned.get_pixel(16, 20)[0], 0);
        assert_eq!(cleaned.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_opening_keeps_dark_dot() {
        let mut page = GrayImage::from_pixel(20, 20, Luma([220]));
        page.put_pixel(10, 10, Luma([0]));

        let settings = DocumentPreprocessing {
            blur_sigma: 0.0,
            ..Default::default()
        };
        let cleaned = clean_document(&page, &settings);

        assert_eq!(cleaned.get_pixel(10, 10)[0], 0);
        assert_eq!(cleaned.get_pixel(12, 10)[0], 255);
    }

    #[test]
    fn test_preprocess_directory_skips_invalid() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();

        page_with_block().save(input.path().join("card.png")).unwrap();
        std::fs::write(input.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::write(input.path().join("notes.txt"), b"ignored").unwrap();

        let written =
            preprocess_directory(input.path(), output.path(), &DocumentPreprocessing::default())
                .unwrap();

        assert_eq!(written, 1);
        assert!(output.path().join("card.png").exists());
        assert!(!output.path().join("broken.jpg").exists());
    }
}
