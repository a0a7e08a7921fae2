//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::pricing::responses::ErrorResponse;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Reference already issued: {0}")]
    Conflict(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("QR code error: {0}")]
    QrCode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Pricing(PricingError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Pricing(PricingError::InvalidExchangeRate { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Pricing(e) => e.error_type(),
            AppError::Conflict(_) => "conflict",
            AppError::Catalog(_) => "catalog",
            AppError::Database(_) => "database",
            AppError::Template(_) => "template",
            AppError::History(_) | AppError::Csv(_) | AppError::Io(_) => "storage",
            AppError::QrCode(_) => "qr_code",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal error".to_string()
        } else {
            tracing::debug!("Request rejected: {}", self);
            self.to_string()
        };

        let details = match &self {
            AppError::Pricing(PricingError::Validation { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
