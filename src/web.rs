use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::handlers::ScanHandler;
use crate::models::{SampleProduct, ScanReport, SAMPLE_PRODUCTS};
use crate::services::preprocess::decode_label_image;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct AppState {
    pub scan_handler: Arc<ScanHandler>,
}

pub fn create_router(scan_handler: Arc<ScanHandler>) -> Router {
    let state = Arc::new(AppState { scan_handler });

    Router::new()
        .route("/", get(index_page))
        .route("/api/scan", post(scan_upload))
        .route("/api/samples", get(sample_products))
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Accepts a multipart upload with an `image` field and returns the scan report.
async fn scan_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ScanReport>, (StatusCode, String)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            log::info!("📤 Upload received: {} ({} bytes)", file_name, bytes.len());
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Missing 'image' field in upload".to_string(),
        )
    })?;

    let image = decode_label_image(&bytes).map_err(|e| {
        log::warn!("⚠️ Rejected upload: {:#}", e);
        (StatusCode::BAD_REQUEST, format!("{:#}", e))
    })?;

    let report = state.scan_handler.scan(&image).await.map_err(|e| {
        log::error!("❌ Label scan failed: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
    })?;

    Ok(Json(report))
}

async fn sample_products() -> Json<&'static [SampleProduct]> {
    Json(&SAMPLE_PRODUCTS)
}

async fn health_check() -> &'static str {
    "OK"
}
