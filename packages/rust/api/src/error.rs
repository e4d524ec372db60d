//! HTTP error mapping for the game API.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use wordsearch_shared::WordSearchError;

/// Errors a handler can return to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// No live session under this id.
    #[error("Game not found")]
    GameNotFound(String),

    /// Anything that aborted the request after validation.
    #[error("{context}")]
    Failed {
        context: &'static str,
        source: WordSearchError,
    },
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub details: String,
}

impl ApiError {
    pub fn failed(context: &'static str, source: WordSearchError) -> Self {
        Self::Failed { context, source }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::GameNotFound(_) => StatusCode::NOT_FOUND,
            Self::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "validation_error",
            Self::GameNotFound(_) => "session_not_found",
            Self::Failed { source, .. } => source.code(),
        }
    }

    fn details(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::GameNotFound(id) => format!("no active game with id '{id}'"),
            Self::Failed { source, .. } => source.to_string(),
        }
    }
}

impl From<WordSearchError> for ApiError {
    fn from(err: WordSearchError) -> Self {
        match err {
            WordSearchError::Validation { message } => Self::BadRequest(message),
            WordSearchError::SessionNotFound(id) => Self::GameNotFound(id),
            other => Self::failed("Request failed", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self.details(), "request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

/// 500 response for a handler that panicked.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%details, "handler panicked");

    let body = ErrorBody {
        error: "Internal server error".to_string(),
        code: "internal_error",
        details,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
