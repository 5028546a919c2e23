use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

/// Business rules that refuse a booking without changing any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("This event is not available for booking")]
    EventUnavailable,

    #[error("No tickets available for this event")]
    NoTickets,

    #[error("Sorry, all tickets are sold out")]
    SoldOut,

    #[error("Only {remaining} ticket(s) left")]
    NotEnoughTickets { remaining: i32 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Store error")]
    StoreError(#[from] StoreError),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected(_) => StatusCode::CONFLICT,
            AppError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Rejected(_) => "REJECTED",
            AppError::StoreError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Failures the user cannot fix by changing their input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::StoreError(_) | AppError::InternalServerError(_)
        )
    }

    /// Message safe to show to the user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Rejected(rejection) => rejection.to_string(),
            AppError::StoreError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        }
    }

    pub(crate) fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request refused");
            }
            AppError::Rejected(rejection) => {
                warn!(code = self.code(), reason = %rejection, "Request rejected");
            }
            AppError::StoreError(e) => {
                error!(error = ?e, "Store error");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => AppError::AuthError("Invalid session".to_string()),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut problems: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let reason = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field}: {reason}")
            })
            .collect();
        problems.sort();
        AppError::ValidationError(problems.join("; "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Do not expose internal details in the response
        error_response(code, self.public_message(), None, status)
    }
}
