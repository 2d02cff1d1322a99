use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use image::DynamicImage;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use super::errors::WebError;
use super::image_utils::{decode_image_bytes, format_to_extension};
use super::page;
use crate::audit::{WriteMode, write_report_table};
use crate::detection::annotate::draw_detections;
use crate::report::ScanReport;

pub const IMAGE_FIELD: &str = "image";

struct Upload {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

// Keeps the extractor's status, so an oversize body stays a 413
fn multipart_error(e: MultipartError) -> WebError {
    WebError::Multipart(e.status(), e.body_text())
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, WebError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        return Ok(Upload {
            bytes: bytes.to_vec(),
            file_name,
        });
    }
    Err(WebError::MissingImage)
}

/// Decode, optionally store, then scan the upload.
/// Returns the report and the annotated image shown on the page.
async fn scan_upload(state: &AppState, multipart: Multipart) -> Result<(ScanReport, DynamicImage), WebError> {
    let upload = read_upload(multipart).await?;
    let (img, format) = decode_image_bytes(&upload.bytes)?;

    let source = match &state.upload_dir {
        Some(dir) => {
            let path = dir.join(format!("{}.{}", Uuid::new_v4(), format_to_extension(format)));
            tokio::fs::write(&path, &upload.bytes)
                .await
                .map_err(|e| WebError::Internal(format!("Failed to store upload {}: {}", path.display(), e)))?;
            path.display().to_string()
        }
        None => upload.file_name.unwrap_or_else(|| "upload".to_string()),
    };

    let scanner = state.scanner.clone();
    let csv_path = state.csv_path.clone();
    let csv_lock = state.csv_lock.clone();
    let (report, annotated) = tokio::task::spawn_blocking(move || {
        let report = scanner.scan(&img, &source)?;
        if let Some(path) = csv_path {
            append_table(&path, &csv_lock, &report);
        }
        let annotated = DynamicImage::ImageRgb8(draw_detections(&img, &report.detections()));
        anyhow::Ok((report, annotated))
    })
    .await
    .map_err(|e| WebError::Internal(e.to_string()))?
    .map_err(|e| WebError::ScanFailed(format!("{:#}", e)))?;

    info!("Scan {} found {} plate(s)", report.id, report.plates.len());

    Ok((report, annotated))
}

fn append_table(path: &Path, lock: &std::sync::Mutex<()>, report: &ScanReport) {
    // Poisoned only when an earlier append panicked
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(e) = write_report_table(path, report, WriteMode::Append) {
        warn!("Failed to append to {}: {:#}", path.display(), e);
    }
}

pub async fn index_handler() -> Html<String> {
    Html(page::render_index())
}

pub async fn scan_page_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    match scan_upload(&state, multipart).await {
        Ok((report, annotated)) => Html(page::render_results(&report, &annotated)).into_response(),
        Err(e) => (e.status(), Html(page::render_error(&e.to_string()))).into_response(),
    }
}

pub async fn scan_api_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScanReport>, WebError> {
    let (report, _) = scan_upload(&state, multipart).await?;
    Ok(Json(report))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
