use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::models::ProductCandidate;

pub const DEFAULT_SEARCH_URL: &str = "https://world.openfoodfacts.org/cgi/search.pl";

/// Trait for product databases (Open Food Facts, fakes in tests, ...)
#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    /// Returns the first search hit, or `None` on any failure.
    async fn lookup_product(&self, name: &str) -> Option<ProductCandidate>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<ProductRecord>,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    nutriments: HashMap<String, Value>,
}

impl From<ProductRecord> for ProductCandidate {
    fn from(record: ProductRecord) -> Self {
        // Numbers arrive as JSON numbers or numeric strings; units are dropped
        let nutrients = record
            .nutriments
            .into_iter()
            .filter_map(|(key, value)| {
                let number = match &value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                number.map(|n| (key, n))
            })
            .collect::<BTreeMap<_, _>>();

        ProductCandidate {
            name: record.product_name.unwrap_or_default(),
            nutrients,
        }
    }
}

/// Open Food Facts product search client
pub struct OpenFoodFactsClient {
    search_url: String,
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(search_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { search_url, client })
    }

    async fn search(&self, name: &str) -> Result<Option<ProductCandidate>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("search_terms", name), ("json", "true")])
            .send()
            .await?;

        log::debug!("📥 Food database response status: {}", response.status());

        if !response.status().is_success() {
            anyhow::bail!("Food database error ({})", response.status());
        }

        let body = response.text().await?;
        first_product(&body)
    }
}

/// Parses a search response body, keeping only the first product.
fn first_product(body: &str) -> Result<Option<ProductCandidate>> {
    let search: SearchResponse = serde_json::from_str(body)?;
    Ok(search.products.into_iter().next().map(ProductCandidate::from))
}

#[async_trait::async_trait]
impl ProductLookup for OpenFoodFactsClient {
    async fn lookup_product(&self, name: &str) -> Option<ProductCandidate> {
        if name.trim().is_empty() {
            log::info!("No product name guessed, skipping food database lookup");
            return None;
        }

        log::info!("🌐 Searching food database for '{}'", name);

        match self.search(name).await {
            Ok(Some(product)) => {
                log::info!("✅ Food database match: '{}'", product.name);
                Some(product)
            }
            Ok(None) => {
                log::info!("No food database results for '{}'", name);
                None
            }
            Err(e) => {
                log::warn!("⚠️ Could not fetch nutrition data for '{}': {}", name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a local port and returns the search URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/cgi/search.pl", addr)
    }

    fn client_for(url: String) -> OpenFoodFactsClient {
        OpenFoodFactsClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_service_unavailable_is_not_found() {
        let url = serve_once("503 Service Unavailable", r#"{"error": "busy"}"#).await;
        assert!(client_for(url).lookup_product("Granola Bar").await.is_none());
    }

    #[tokio::test]
    async fn test_non_json_body_is_not_found() {
        let url = serve_once("200 OK", "<html>Maintenance</html>").await;
        assert!(client_for(url).lookup_product("Granola Bar").await.is_none());
    }

    #[tokio::test]
    async fn test_successful_search_returns_first_product() {
        let url = serve_once(
            "200 OK",
            r#"{"products": [{"product_name": "Granola Bar", "nutriments": {"sugars_100g": 21.5}}]}"#,
        )
        .await;

        let product = client_for(url).lookup_product("Granola Bar").await.unwrap();
        assert_eq!(product.name, "Granola Bar");
        assert_eq!(product.nutrient("sugars_100g"), Some(21.5));
    }

    #[test]
    fn test_first_product_parsing() {
        let json = r#"{
            "count": 2,
            "products": [
                {
                    "product_name": "Granola Bar",
                    "nutriments": {
                        "sugars_100g": 21.5,
                        "fat_100g": "9.1",
                        "sugars_unit": "g"
                    }
                },
                { "product_name": "Other Bar", "nutriments": {} }
            ]
        }"#;

        let product = first_product(json).unwrap().unwrap();

        assert_eq!(product.name, "Granola Bar");
        assert_eq!(product.nutrient("sugars_100g"), Some(21.5));
        assert_eq!(product.nutrient("fat_100g"), Some(9.1));
        assert_eq!(product.nutrient("sugars_unit"), None);
    }

    #[test]
    fn test_missing_products() {
        assert!(first_product(r#"{"count": 0}"#).unwrap().is_none());
        assert!(first_product(r#"{"products": []}"#).unwrap().is_none());
    }

    #[test]
    fn test_product_without_name() {
        let product = first_product(r#"{"products": [{"nutriments": {"sugars_100g": 3}}]}"#)
            .unwrap()
            .unwrap();

        assert_eq!(product.name, "");
        assert_eq!(product.nutrient("sugars_100g"), Some(3.0));
    }

    #[test]
    fn test_invalid_json() {
        assert!(first_product("<html>busy</html>").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_found() {
        let client = OpenFoodFactsClient::new(
            "http://127.0.0.1:9/cgi/search.pl".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(client.lookup_product("Granola Bar").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_name_skips_lookup() {
        let client =
            OpenFoodFactsClient::new(DEFAULT_SEARCH_URL.to_string(), Duration::from_secs(2))
                .unwrap();

        assert!(client.lookup_product("   ").await.is_none());
    }
}
