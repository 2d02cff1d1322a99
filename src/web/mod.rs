pub mod errors;
pub mod handlers;
pub mod image_utils;
pub mod page;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::detection::DetectionPipeline;
use image_utils::MAX_IMAGE_SIZE;

/// Room for the multipart envelope around a maximum-size image
const BODY_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<DetectionPipeline>,
    pub csv_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    csv_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(scanner: DetectionPipeline) -> Self {
        Self {
            scanner: Arc::new(scanner),
            csv_path: None,
            upload_dir: None,
            csv_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_csv(mut self, path: PathBuf) -> Self {
        self.csv_path = Some(path);
        self
    }

    /// Uploads are kept under a random name in `dir`, which must exist.
    pub fn with_upload_dir(mut self, dir: PathBuf) -> Self {
        self.upload_dir = Some(dir);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/scan", post(handlers::scan_page_handler))
        .route("/api/scan", post(handlers::scan_api_handler))
        .route("/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + BODY_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
