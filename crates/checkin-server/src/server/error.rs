use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use checkin_core::{AuthError, LedgerError};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::utils::format_timestamp;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authorised")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Check-in not allowed until {}", until(.0))]
    CooldownActive(i64),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(#[source] LedgerError),

    #[error("Ledger task failed: {0}")]
    Task(#[from] JoinError),
}

fn until(next_allowed_at: &i64) -> String {
    format_timestamp(*next_allowed_at)
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::CooldownActive { next_allowed_at } => {
                AppError::CooldownActive(next_allowed_at)
            }
            LedgerError::NegativeCooldown(_) | LedgerError::CooldownOverflow(_) => {
                AppError::BadRequest("Invalid time")
            }
            other => AppError::Internal(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::MalformedToken(_) => AppError::Unauthorized,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::CooldownActive(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::Task(_) => {
                error!(error = %self, "Request failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}
