//! HTTP error mapping
//!
//! Every failure leaving a handler becomes an [`ApiError`], which renders as
//! a status code plus `{"code": ..., "error": ...}`. Internal causes are
//! logged where they are converted and never reach the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{PasswordError, TokenError};
use crate::domain::StoreError;

/// Why a request was refused with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthorized {
    MissingHeader,
    BadFormat,
    InvalidToken,
    /// Unknown username or wrong password; deliberately indistinguishable.
    InvalidCredentials,
}

impl Unauthorized {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::BadFormat => "bad_format",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing authorization header",
            Self::BadFormat => "invalid authorization header format",
            Self::InvalidToken => "invalid or expired token",
            Self::InvalidCredentials => "invalid credentials",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{}", .0.message())]
    Unauthorized(Unauthorized),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// Log `cause` and hide it behind a generic 500.
    pub fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, cause);
        Self::Internal
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Unauthorized(reason) => reason.code(),
            Self::DuplicateUsername => "duplicate_username",
            Self::Internal => "internal_error",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable message
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code().to_string(),
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<Unauthorized> for ApiError {
    fn from(reason: Unauthorized) -> Self {
        Self::Unauthorized(reason)
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Empty | PasswordError::TooLong => Self::Validation(e.to_string()),
            PasswordError::Mismatch => Self::Unauthorized(Unauthorized::InvalidCredentials),
            PasswordError::Hashing(_) => Self::internal("Password hashing failed", e),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidSignature | TokenError::Expired | TokenError::Malformed => {
                Self::Unauthorized(Unauthorized::InvalidToken)
            }
            TokenError::MissingSecret | TokenError::InvalidTtl(_) | TokenError::Signing(_) => {
                Self::internal("Token issuance failed", e)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername(_) => Self::DuplicateUsername,
            StoreError::NotFound(_) | StoreError::Persistence(_) => {
                Self::internal("User store failed", e)
            }
        }
    }
}
