//! Image preprocessing for the YOLO models
//!
//! Handles resizing and tensor conversion for the detector and classifier.
//! Both models expect RGB scaled to [0, 1] in NCHW layout, no mean/std.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array3, Array4};

/// Convert an RGB image to an HWC f32 array scaled to 0-1
pub fn rgb_to_f32(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut rgb = Array3::<f32>::zeros((height as usize, width as usize, 3));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            rgb[[y as usize, x as usize, c]] = f32::from(pixel[c]) / 255.0;
        }
    }

    rgb
}

/// Convert HWC image to NCHW tensor (batch size 1)
pub fn hwc_to_nchw(image: &Array3<f32>) -> Array4<f32> {
    let (h, w, c) = image.dim();
    let mut tensor = Array4::<f32>::zeros((1, c, h, w));

    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                tensor[[0, ch, y, x]] = image[[y, x, ch]];
            }
        }
    }

    tensor
}

/// Stretch the image to a `target_size` square.
///
/// Returns the resized image and the (x, y) factors that map model
/// coordinates back to source pixels.
pub fn resize_for_detection(image: &RgbImage, target_size: u32) -> (RgbImage, (f32, f32)) {
    let (w, h) = image.dimensions();
    let resized = imageops::resize(image, target_size, target_size, FilterType::Triangle);

    let scale_x = w as f32 / target_size as f32;
    let scale_y = h as f32 / target_size as f32;

    (resized, (scale_x, scale_y))
}

/// Resize the shorter side to `target_size` then center crop a square
pub fn resize_for_classification(image: &RgbImage, target_size: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let short = w.min(h).max(1) as f32;
    let scale = target_size as f32 / short;

    let new_w = ((w as f32 * scale).round() as u32).max(target_size);
    let new_h = ((h as f32 * scale).round() as u32).max(target_size);

    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let left = (new_w - target_size) / 2;
    let top = (new_h - target_size) / 2;

    imageops::crop_imm(&resized, left, top, target_size, target_size).to_image()
}

/// Full preprocessing pipeline for the detector
pub fn preprocess_for_detection(image: &RgbImage, target_size: u32) -> (Array4<f32>, (f32, f32)) {
    let (resized, scale) = resize_for_detection(image, target_size);
    let tensor = hwc_to_nchw(&rgb_to_f32(&resized));
    (tensor, scale)
}

/// Full preprocessing pipeline for the classifier
pub fn preprocess_for_classification(image: &RgbImage, target_size: u32) -> Array4<f32> {
    let resized = resize_for_classification(image, target_size);
    hwc_to_nchw(&rgb_to_f32(&resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rgb_to_f32() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 128]));

        let rgb = rgb_to_f32(&img);

        assert_eq!(rgb.dim(), (1, 2, 3));
        assert!((rgb[[0, 0, 0]] - 1.0).abs() < 0.01);
        assert!(rgb[[0, 0, 1]].abs() < 0.01);
        assert!((rgb[[0, 1, 1]] - 1.0).abs() < 0.01);
        assert!((rgb[[0, 1, 2]] - 0.502).abs() < 0.01);
    }

    #[test]
    fn test_hwc_to_nchw() {
        let hwc = Array3::<f32>::from_shape_fn((10, 20, 3), |(h, w, c)| {
            (h * 100 + w * 10 + c) as f32
        });

        let nchw = hwc_to_nchw(&hwc);

        assert_eq!(nchw.dim(), (1, 3, 10, 20));
        assert_eq!(nchw[[0, 1, 5, 10]], hwc[[5, 10, 1]]);
    }

    #[test]
    fn test_detection_scale_factors() {
        let img = RgbImage::new(1280, 320);
        let (tensor, (sx, sy)) = preprocess_for_detection(&img, 640);

        assert_eq!(tensor.dim(), (1, 3, 640, 640));
        assert!((sx - 2.0).abs() < 1e-6);
        assert!((sy - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classification_center_crop() {
        // Left half black, right half white; the center crop keeps both
        let mut img = RgbImage::from_pixel(448, 224, Rgb([0, 0, 0]));
        for y in 0..224 {
            for x in 224..448 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let crop = resize_for_classification(&img, 224);
        assert_eq!(crop.dimensions(), (224, 224));
        assert_eq!(crop.get_pixel(10, 100)[0], 0);
        assert_eq!(crop.get_pixel(213, 100)[0], 255);

        let tensor = preprocess_for_classification(&img, 224);
        assert_eq!(tensor.dim(), (1, 3, 224, 224));
    }
}
