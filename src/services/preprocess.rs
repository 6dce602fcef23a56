use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat};

pub const DEFAULT_THRESHOLD: u8 = 150;
pub const DEFAULT_BLUR_SIGMA: f32 = 1.0;

/// Decodes an uploaded label photo. Only PNG and JPEG are accepted.
pub fn decode_label_image(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes).context("Unrecognized image data")?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        anyhow::bail!("Unsupported image format: {:?} (expected PNG or JPEG)", format);
    }

    image::load_from_memory_with_format(bytes, format).context("Failed to decode image")
}

/// Grayscale, binary threshold and a light Gaussian blur to help OCR.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    threshold: u8,
    blur_sigma: f32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_BLUR_SIGMA)
    }
}

impl ImagePreprocessor {
    pub fn new(threshold: u8, blur_sigma: f32) -> Self {
        Self {
            threshold,
            blur_sigma,
        }
    }

    pub fn process(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let binary = binarize(&gray, self.threshold);
        let smoothed = image::imageops::blur(&binary, self.blur_sigma);

        log::debug!(
            "🧹 Preprocessed {}x{} image (threshold {}, sigma {})",
            smoothed.width(),
            smoothed.height(),
            self.threshold,
            self.blur_sigma
        );

        DynamicImage::ImageLuma8(smoothed)
    }
}

/// Pixels above the cutoff become white, the rest black.
pub(crate) fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut binary = gray.clone();
    for pixel in binary.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { 255 } else { 0 };
    }
    binary
}
