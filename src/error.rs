use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Access code missing or wrong. The payload is the machine-readable reason.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Token(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to the client. Internal details stay in the log.
    fn public_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::Config(msg)
            | AppError::Upstream(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::Token(_) => "Failed to create access token".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            ok: false,
            error: self.public_message(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
