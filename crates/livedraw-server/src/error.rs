//! Request-level errors and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use livedraw_core::{EditError, RenderError};
use thiserror::Error;
use tracing::{error, warn};

/// Everything a single request can fail with.
///
/// Only the request that hit the error sees it; drawings and other viewers
/// are unaffected.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid edit: {0}")]
    Edit(#[from] EditError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Edit(_) => StatusCode::BAD_REQUEST,
            AppError::Render(RenderError::InvalidSize { .. }) => StatusCode::BAD_REQUEST,
            AppError::Render(RenderError::Encode(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else if status != StatusCode::NOT_FOUND {
            warn!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
