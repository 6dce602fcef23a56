use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lines of text produced by the OCR engine. May be empty or garbled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    raw: String,
}

impl ExtractedText {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.raw.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

impl From<&[&str]> for ExtractedText {
    fn from(lines: &[&str]) -> Self {
        Self::new(lines.join("\n"))
    }
}

/// A tentative match from the food database search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub name: String,
    pub nutrients: BTreeMap<String, f64>,
}

impl ProductCandidate {
    pub fn nutrient(&self, key: &str) -> Option<f64> {
        self.nutrients.get(key).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SugarSource {
    Database,
    Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SugarReading {
    Found {
        /// Quantity text as read; label captures are kept verbatim.
        value: String,
        /// Parsed quantity, absent when the captured text is not a number.
        grams: Option<f64>,
        source: SugarSource,
    },
    NotFound,
}

impl SugarReading {
    pub fn grams(&self) -> Option<f64> {
        match self {
            SugarReading::Found { grams, .. } => *grams,
            SugarReading::NotFound => None,
        }
    }
}

impl std::fmt::Display for SugarReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SugarReading::Found {
                value,
                source: SugarSource::Database,
                ..
            } => write!(f, "{}g per 100g", value),
            SugarReading::Found {
                value,
                source: SugarSource::Label,
                ..
            } => write!(f, "{}g (from label)", value),
            SugarReading::NotFound => write!(f, "Not found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SugarBand {
    Low,
    Medium,
    High,
    Unknown,
}

impl SugarBand {
    pub fn color(&self) -> &'static str {
        match self {
            SugarBand::Low => "green",
            SugarBand::Medium => "orange",
            SugarBand::High => "red",
            SugarBand::Unknown => "gray",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SugarBand::Low => "Low sugar content",
            SugarBand::Medium => "Medium sugar content, enjoy in moderation",
            SugarBand::High => "High sugar content",
            SugarBand::Unknown => "Sugar level unknown, please check the label manually",
        }
    }
}

impl std::fmt::Display for SugarBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SugarBand::Low => "Low",
            SugarBand::Medium => "Medium",
            SugarBand::High => "High",
            SugarBand::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Reference sugar content for a few everyday products, shown on the upload page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleProduct {
    pub product: &'static str,
    pub sugar_grams: f64,
}

pub static SAMPLE_PRODUCTS: [SampleProduct; 3] = [
    SampleProduct {
        product: "Apple Juice",
        sugar_grams: 24.0,
    },
    SampleProduct {
        product: "Soda",
        sugar_grams: 39.0,
    },
    SampleProduct {
        product: "Yogurt",
        sugar_grams: 18.0,
    },
];

/// Everything the page (or the CLI) shows for one scanned label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub extracted_text: String,
    pub product_name: String,
    pub sugar: String,
    pub sugar_reading: SugarReading,
    pub band: SugarBand,
    pub color: String,
    pub message: String,
    pub lookup_status: String,
    pub nutriments: Option<BTreeMap<String, f64>>,
    pub scanned_at: DateTime<Utc>,
}
