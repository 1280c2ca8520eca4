//! Error taxonomy for the matching engine.
//!
//! Domain failures are the caller's problem and carry a message meant for
//! them. Storage failures are the system's problem; their detail is logged
//! and never echoed back.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::StoreError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidAction(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub type MatchResult<T> = Result<T, MatchError>;

impl MatchError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_error",
            MatchError::InvalidAction(_) => "invalid_action",
            MatchError::NotFound(_) => "not_found",
            MatchError::Unauthenticated(_) => "unauthenticated",
            MatchError::Authorization(_) => "access_denied",
            MatchError::InvalidState(_) => "invalid_state",
            MatchError::Conflict(_) => "conflict",
            MatchError::Storage(_) => "internal_error",
        }
    }

    /// True when the caller sent something we refuse, false when we failed
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MatchError::Storage(_))
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) | MatchError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            MatchError::Authorization(_) => StatusCode::FORBIDDEN,
            MatchError::InvalidState(_) | MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            MatchError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "The service failed to process the request".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}
