//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::deck::DeckError;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Invalid deck payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: &'static str,
    pub message: String,
}

impl AppError {
    /// Serialization we perform ourselves failed; the client is not at fault
    pub fn from_encoding(err: serde_json::Error) -> Self {
        AppError::Internal(format!("failed to encode JSON: {}", err))
    }

    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Payload(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_payload"),
            AppError::Pricing(_) => (StatusCode::UNPROCESSABLE_ENTITY, "pricing_error"),
            AppError::Deck(DeckError::Composition { .. }) => (StatusCode::UNPROCESSABLE_ENTITY, "composition_error"),
            AppError::Deck(_) => (StatusCode::INTERNAL_SERVER_ERROR, "generation_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "template_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            status
                .canonical_reason()
                .unwrap_or("Internal error")
                .to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error_type, message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
