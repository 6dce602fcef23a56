use anyhow::Result;
use image::DynamicImage;
use std::sync::Arc;

use crate::models::{ScanReport, SugarReading};
use crate::services::nutrition::guess_product_name;
use crate::services::{ImagePreprocessor, NutritionResolver, ProductLookup, TextRecognizer};

const LOOKUP_FOUND: &str = "Found in food database";
const LOOKUP_MISSING: &str = "Could not fetch nutrition data";

/// Runs one label photo through preprocess → OCR → lookup → sugar band.
pub struct ScanHandler {
    preprocessor: ImagePreprocessor,
    recognizer: Arc<dyn TextRecognizer>,
    lookup: Arc<dyn ProductLookup>,
    resolver: NutritionResolver,
}

impl ScanHandler {
    pub fn new(
        preprocessor: ImagePreprocessor,
        recognizer: Arc<dyn TextRecognizer>,
        lookup: Arc<dyn ProductLookup>,
    ) -> Result<Self> {
        let resolver = NutritionResolver::new()?;
        log::debug!("Loaded {} sugar rules", resolver.rules().len());

        Ok(Self {
            preprocessor,
            recognizer,
            lookup,
            resolver,
        })
    }

    /// OCR errors are returned to the caller; lookup failures only
    /// downgrade the report.
    pub async fn scan(&self, image: &DynamicImage) -> Result<ScanReport> {
        log::info!("📸 Scanning label image {}x{}", image.width(), image.height());

        let cleaned = self.preprocessor.process(image);
        let text = self.recognizer.recognize_text(&cleaned).await?;
        if text.is_empty() {
            log::warn!("⚠️ OCR found no text on the label");
        }

        let product_name = guess_product_name(&text);
        log::info!("🏷️ Guessed product name: '{}'", product_name);

        let product = self.lookup.lookup_product(&product_name).await;
        let reading = self.resolver.extract_sugar(product.as_ref(), &text);
        let sugar = reading.to_string();
        let band = self.resolver.classify(&sugar);

        log::info!("🍬 Sugar: {} ({:?} g) → {}", sugar, reading.grams(), band);

        Ok(ScanReport {
            extracted_text: text.as_str().to_string(),
            product_name,
            sugar,
            sugar_reading: reading,
            band,
            color: band.color().to_string(),
            message: band.message().to_string(),
            lookup_status: (if product.is_some() { LOOKUP_FOUND } else { LOOKUP_MISSING })
                .to_string(),
            nutriments: product.map(|p| p.nutrients),
            scanned_at: chrono::Utc::now(),
        })
    }
}

pub fn format_report(report: &ScanReport) -> String {
    let source = match &report.sugar_reading {
        SugarReading::Found { source, .. } => format!("{:?}", source).to_lowercase(),
        SugarReading::NotFound => "none".to_string(),
    };

    let mut out = format!(
        "📄 Extracted text\n\
         {}\n\n\
         🏷️ Product: {}\n\
         🌐 Lookup: {}\n\
         🍬 Sugar: {} (source: {})\n\
         🚦 Level: {} [{}]\n\
         {}",
        report.extracted_text.trim(),
        if report.product_name.is_empty() { "Unknown" } else { report.product_name.as_str() },
        report.lookup_status,
        report.sugar,
        source,
        report.band,
        report.color,
        report.message,
    );

    if let Some(nutriments) = &report.nutriments {
        if let Ok(json) = serde_json::to_string_pretty(nutriments) {
            out.push_str("\n\n🧾 Nutriments\n");
            out.push_str(&json);
        }
    }

    out
}
