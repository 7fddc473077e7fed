//! Request-level errors and their HTTP rendering.
//!
//! Form endpoints turn [`AppError::user_message`] errors into flash messages
//! and redirect; everything else (and every JSON endpoint) answers with the
//! status from [`AppError::status_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use compute::ComputeError;
use model::access::AccessError;
use model::validation::ValidationError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// A submitted field failed a rule.
    #[error("{}", .0.message)]
    Validation(#[from] ValidationError),

    /// The resource exists but belongs to someone else.
    #[error("Not allowed")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// The write would break a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// Malformed query parameters on a JSON endpoint.
    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Dashboard computation failed: {0}")]
    Compute(#[from] ComputeError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl From<AccessError> for AppError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::Forbidden => AppError::Forbidden,
        }
    }
}

impl AppError {
    /// Message to show the user on the next page, for errors the user can fix.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AppError::Validation(err) => Some(err.message.clone()),
            AppError::Conflict(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Compute(_)
            | AppError::Session(_)
            | AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Compute(_) | AppError::Session(_) | AppError::Password(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}
