//! API error type and its mapping to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::window::WindowError;

/// Message returned for any server-side failure.
const INTERNAL_MESSAGE: &str = "Internal server error.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is malformed; nothing was read from or written to storage.
    #[error("{0}")]
    BadRequest(String),

    /// Storage or other server-side failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<WindowError> for ApiError {
    fn from(err: WindowError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "Rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        message,
                        reference: None,
                    }),
                )
                    .into_response()
            }
            ApiError::Internal(err) => {
                let reference = uuid::Uuid::new_v4().to_string();
                tracing::error!(%reference, error = ?err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        message: INTERNAL_MESSAGE.to_string(),
                        reference: Some(reference),
                    }),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
