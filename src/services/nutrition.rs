use anyhow::Result;
use regex::Regex;

use crate::models::{ExtractedText, ProductCandidate, SugarBand, SugarReading, SugarSource};

/// Label headings that are never the product name.
const HEADING_KEYWORDS: [&str; 3] = ["ingredients", "nutrition facts", "serving size"];
const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 50;

/// Nutrient key used for the structured sugar value of a database record.
pub const SUGARS_PER_100G: &str = "sugars_100g";

const LOW_SUGAR_LIMIT: f64 = 5.0;
const MEDIUM_SUGAR_LIMIT: f64 = 10.0;

/// Picks the first OCR line that looks like a product name.
///
/// Headings and lines outside 3..=50 characters are skipped. When nothing
/// qualifies the first raw line is returned unchanged, and an empty string
/// when there are no lines at all.
pub fn guess_product_name(text: &ExtractedText) -> String {
    let qualifying = text.lines().map(str::trim).find(|line| {
        let lower = line.to_lowercase();
        let len = line.chars().count();
        !HEADING_KEYWORDS.iter().any(|k| lower.contains(k))
            && (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
    });

    match qualifying {
        Some(line) => line.to_string(),
        None => text.lines().next().unwrap_or_default().to_string(),
    }
}

/// A named pattern that captures a sugar quantity in grams from label text.
#[derive(Debug, Clone)]
pub struct SugarRule {
    pub name: &'static str,
    pattern: Regex,
}

impl SugarRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn capture(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Resolves a sugar reading from a database record or raw label text,
/// and classifies it into a band.
pub struct NutritionResolver {
    rules: Vec<SugarRule>,
    number: Regex,
}

impl NutritionResolver {
    pub fn new() -> Result<Self> {
        let rules = vec![
            SugarRule::new("sugars", r"Sugars?\s*[:]+\s*([0-9.]+)\s*g")?,
            SugarRule::new("of_which_sugars", r"of which sugars\s*[:]+\s*([0-9.]+)\s*g")?,
        ];
        Self::with_rules(rules)
    }

    /// Rules are tried in the given order; the first capture wins.
    pub fn with_rules(rules: Vec<SugarRule>) -> Result<Self> {
        Ok(Self {
            rules,
            number: Regex::new(r"\d*\.?\d+")?,
        })
    }

    pub fn rules(&self) -> &[SugarRule] {
        &self.rules
    }

    pub fn extract_sugar(
        &self,
        product: Option<&ProductCandidate>,
        text: &ExtractedText,
    ) -> SugarReading {
        if let Some(grams) = product.and_then(|p| p.nutrient(SUGARS_PER_100G)) {
            return SugarReading::Found {
                value: grams.to_string(),
                grams: Some(grams),
                source: SugarSource::Database,
            };
        }

        for rule in &self.rules {
            if let Some(value) = rule.capture(text.as_str()) {
                log::debug!("🔎 Sugar matched by rule '{}': {}", rule.name, value);
                return SugarReading::Found {
                    grams: value.parse::<f64>().ok(),
                    value,
                    source: SugarSource::Label,
                };
            }
        }

        SugarReading::NotFound
    }

    /// Classifies by the first number found in the displayed sugar string.
    /// 5 is Medium and 10 is High.
    pub fn classify(&self, sugar: &str) -> SugarBand {
        let grams = match self
            .number
            .find(sugar)
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            Some(grams) => grams,
            None => return SugarBand::Unknown,
        };

        if grams < LOW_SUGAR_LIMIT {
            SugarBand::Low
        } else if grams < MEDIUM_SUGAR_LIMIT {
            SugarBand::Medium
        } else {
            SugarBand::High
        }
    }
}
