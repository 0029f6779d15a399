//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::service::SearchError;

impl SearchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) | Self::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Extraction(_) | Self::ProcessingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!("{}", self);
        }
        detail(self.status_code(), self.to_string())
    }
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request input (bad mode string, missing field).
    BadRequest(String),
    Search(SearchError),
    /// The blocking worker panicked or was cancelled.
    Internal(String),
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        Self::Search(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, msg),
            Self::Search(e) => e.into_response(),
            Self::Internal(msg) => {
                tracing::error!("{}", msg);
                detail(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

fn detail(status: StatusCode, msg: String) -> Response {
    (status, Json(json!({ "detail": msg }))).into_response()
}
