mod config;
mod handlers;
mod models;
mod services;
#[cfg(feature = "web-server")]
mod web; // Upload page and scan API

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

use config::Config;
use handlers::{format_report, ScanHandler};
use services::preprocess::decode_label_image;
use services::{ImagePreprocessor, OpenFoodFactsClient, TesseractRecognizer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    let config = Config::from_env()?;
    log::debug!("Loaded configuration: {:?}", config);

    let recognizer = Arc::new(TesseractRecognizer::new(config.ocr_lang.clone()));
    log::info!("✅ OCR engine: tesseract ({})", config.ocr_lang);

    let lookup = Arc::new(OpenFoodFactsClient::new(
        config.food_facts_url.clone(),
        config.food_facts_timeout,
    )?);
    log::info!(
        "✅ Food database: {} (timeout {:?})",
        config.food_facts_url,
        config.food_facts_timeout
    );

    let scan_handler = Arc::new(ScanHandler::new(
        ImagePreprocessor::new(config.threshold, config.blur_sigma),
        recognizer,
        lookup,
    )?);

    // One-shot mode: scan a single file and print the report
    if let Some(path) = env::args().nth(1) {
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path))?;
        let image = decode_label_image(&bytes)?;
        let report = scan_handler.scan(&image).await?;
        println!("{}", format_report(&report));
        return Ok(());
    }

    #[cfg(feature = "web-server")]
    {
        let app = web::create_router(scan_handler);
        let listener = tokio::net::TcpListener::bind(&config.server_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.server_addr))?;

        log::info!("🌐 Sugar Detector listening on http://{}", config.server_addr);
        println!("\n🍬 Sugar Detector is running: http://{}", config.server_addr);
        println!("🛑 Press Ctrl+C to stop\n");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                log::info!("🛑 Shutting down...");
            })
            .await?;
    }

    #[cfg(not(feature = "web-server"))]
    {
        let _ = scan_handler;
        eprintln!("Usage: sugar-label-scanner <label-image>");
    }

    Ok(())
}
