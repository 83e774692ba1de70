use anyhow::{anyhow, Result};
use image::{GrayImage, ImageBuffer, Luma, Rgba};

use crate::config::OcrConfig;

/// 3x3 sharpen kernel, already divided by its scale of 16.
const SHARPEN: [f32; 9] = [
    -0.125, -0.125, -0.125, //
    -0.125, 2.0, -0.125, //
    -0.125, -0.125, -0.125,
];

/// Normalizes a captured region for OCR.
///
/// Grayscale, contrast boost around the mean, sharpen, then binarize: pixels
/// brighter than the threshold become white (255), all others black (0).
/// If any step fails the plain grayscale image is returned instead.
pub fn normalize(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, config: &OcrConfig) -> GrayImage {
    match try_normalize(img, config) {
        Ok(out) => out,
        Err(e) => {
            crate::log(&format!("Normalization failed, using grayscale: {:#}", e));
            image::imageops::grayscale(img)
        }
    }
}

pub fn try_normalize(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    config: &OcrConfig,
) -> Result<GrayImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("Cannot normalize an empty {}x{} image", width, height));
    }

    let gray = image::imageops::grayscale(img);
    let contrasted = enhance_contrast(&gray, config.contrast_factor);
    let sharpened = sharpen(&contrasted);
    Ok(binarize(&sharpened, config.binarize_threshold))
}

/// Scales each pixel's distance from the mean luminance by `factor`.
pub fn enhance_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f64 / count as f64 + 0.5).floor() as f32;

    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        let value = mean + factor * (pixel[0] as f32 - mean);
        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }
    output
}

/// Applies the sharpen kernel. Edge pixels are copied unchanged.
pub fn sharpen(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = img.clone();
    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0.0f32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let p = img.get_pixel(x + kx - 1, y + ky - 1)[0] as f32;
                    acc += p * SHARPEN[(ky * 3 + kx) as usize];
                }
            }
            output.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    output
}

/// Pixels above `threshold` become white, everything else black.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    output
}
