use anyhow::Result;
use image::{imageops::FilterType, DynamicImage};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;

use crate::models::ExtractedText;

/// Trait for OCR engines (Tesseract, fakes in tests, ...)
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, image: &DynamicImage) -> Result<ExtractedText>;
}

/// Tesseract OCR through the system `tesseract` binary.
pub struct TesseractRecognizer {
    lang: String,
}

impl TesseractRecognizer {
    pub fn new(lang: String) -> Self {
        Self { lang }
    }

    fn run(image: DynamicImage, lang: String) -> Result<String> {
        // Tesseract wants glyphs at least 10-12px tall
        let min_dimension = image.width().min(image.height());
        let (scaled, upscaled) = match upscale_factor(min_dimension) {
            1 => (image, false),
            factor => {
                let (w, h) = (image.width() * factor, image.height() * factor);
                log::info!("Upscaling small label {}x to {}x{}", factor, w, h);
                (image.resize(w, h, FilterType::Lanczos3), true)
            }
        };

        let tess_img = Image::from_dynamic_image(&scaled)
            .map_err(|e| anyhow::anyhow!("Failed to create tesseract image: {}", e))?;

        let args = Args {
            lang,
            config_variables: HashMap::new(),
            dpi: Some(if upscaled { 300 } else { 150 }),
            psm: Some(6), // Single uniform block of text
            oem: Some(3),
        };

        rusty_tesseract::image_to_string(&tess_img, &args)
            .map_err(|e| anyhow::anyhow!("Tesseract failed: {}", e))
    }
}

fn upscale_factor(min_dimension: u32) -> u32 {
    if min_dimension < 100 {
        4
    } else if min_dimension < 200 {
        2
    } else {
        1
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize_text(&self, image: &DynamicImage) -> Result<ExtractedText> {
        log::info!(
            "🔤 Running OCR ({}) on {}x{} image...",
            self.lang,
            image.width(),
            image.height()
        );

        let image = image.clone();
        let lang = self.lang.clone();
        let text = tokio::task::spawn_blocking(move || Self::run(image, lang)).await??;

        log::info!("✅ OCR produced {} characters", text.len());
        Ok(ExtractedText::new(text))
    }
}
