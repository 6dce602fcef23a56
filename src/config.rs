use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::services::food_facts::DEFAULT_SEARCH_URL;
use crate::services::preprocess::{DEFAULT_BLUR_SIGMA, DEFAULT_THRESHOLD};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub ocr_lang: String,
    pub food_facts_url: String,
    pub food_facts_timeout: Duration,
    pub threshold: u8,
    pub blur_sigma: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match var("FOOD_FACTS_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("FOOD_FACTS_TIMEOUT_SECS must be whole seconds, got '{}'", v))?,
            None => 10,
        };
        if timeout_secs == 0 {
            anyhow::bail!("FOOD_FACTS_TIMEOUT_SECS must be at least 1 second");
        }

        let threshold = match var("LABEL_THRESHOLD") {
            Some(v) => v
                .trim()
                .parse::<u8>()
                .with_context(|| format!("LABEL_THRESHOLD must be 0-255, got '{}'", v))?,
            None => DEFAULT_THRESHOLD,
        };

        let blur_sigma = match var("LABEL_BLUR_SIGMA") {
            Some(v) => v
                .trim()
                .parse::<f32>()
                .with_context(|| format!("LABEL_BLUR_SIGMA must be a number, got '{}'", v))?,
            None => DEFAULT_BLUR_SIGMA,
        };
        if !blur_sigma.is_finite() || blur_sigma <= 0.0 {
            anyhow::bail!("LABEL_BLUR_SIGMA must be positive, got {}", blur_sigma);
        }

        Ok(Self {
            server_addr: var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            ocr_lang: var("OCR_LANG").unwrap_or_else(|| "eng".to_string()),
            food_facts_url: var("FOOD_FACTS_SEARCH_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            food_facts_timeout: Duration::from_secs(timeout_secs),
            threshold,
            blur_sigma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.ocr_lang, "eng");
        assert_eq!(config.food_facts_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.food_facts_timeout, Duration::from_secs(10));
        assert_eq!(config.threshold, 150);
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("OCR_LANG", "eng+fra"),
            ("FOOD_FACTS_TIMEOUT_SECS", "3"),
            ("LABEL_THRESHOLD", "128"),
        ])
        .unwrap();

        assert_eq!(config.ocr_lang, "eng+fra");
        assert_eq!(config.food_facts_timeout, Duration::from_secs(3));
        assert_eq!(config.threshold, 128);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_with(&[("LABEL_THRESHOLD", "300")]).is_err());
        assert!(config_with(&[("FOOD_FACTS_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_with(&[("LABEL_BLUR_SIGMA", "0")]).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = config_with(&[("FOOD_FACTS_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("at least 1 second"));
    }

    #[test]
    fn test_rejects_non_finite_sigma() {
        assert!(config_with(&[("LABEL_BLUR_SIGMA", "inf")]).is_err());
        assert!(config_with(&[("LABEL_BLUR_SIGMA", "NaN")]).is_err());
        assert!(config_with(&[("LABEL_BLUR_SIGMA", "0.8")]).is_ok());
    }
}
