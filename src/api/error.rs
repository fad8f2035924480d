use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler errors, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("No file received.")]
    MissingFile,
    #[error("Could not access the stored state.")]
    Storage(anyhow::Error),
    #[error("Something went wrong while uploading.")]
    Upload(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(e) | Self::Upload(e) => tracing::error!("{}: {:#}", self, e),
            _ => tracing::debug!("Rejected request: {}", self),
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
