use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use super::image_utils::ImageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("No image uploaded (expected multipart field \"image\")")]
    MissingImage,

    #[error("Invalid multipart body: {1}")]
    Multipart(StatusCode, String),

    #[error(transparent)]
    InvalidImage(#[from] ImageError),

    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::MissingImage => StatusCode::BAD_REQUEST,
            WebError::Multipart(status, _) => *status,
            WebError::InvalidImage(ImageError::TooLarge(_, _)) => StatusCode::PAYLOAD_TOO_LARGE,
            WebError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            WebError::ScanFailed(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let error_type = match self {
            WebError::MissingImage => "missing_image",
            WebError::Multipart(status, _) if *status == StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            WebError::Multipart(..) => "invalid_request",
            WebError::InvalidImage(_) => "invalid_image",
            WebError::ScanFailed(_) => "scan_failed",
            WebError::Internal(_) => "internal_error",
        };
        ErrorResponse {
            error_type: error_type.to_string(),
            message: self.to_string(),
        }
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}
