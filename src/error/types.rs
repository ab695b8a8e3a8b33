/**
 * Error Types
 *
 * This module defines the error taxonomy used across the auth service.
 * Every error maps to an HTTP status code and a client-facing message.
 *
 * # Error Categories
 *
 * - `Validation` - malformed or missing input (400)
 * - `Duplicate` - unique-field collision on name or email (409)
 * - `Authentication` - bad credentials or a bad/expired token (401)
 * - `Authorization` - inactive account, unverified email, role mismatch (403)
 * - `Locked` - account locked after repeated failed logins (423)
 * - `NotFound` - referenced account does not exist (404)
 * - `RateLimited` - too many attempts inside the window (429)
 * - `Mail` / `Database` / `Internal` - infrastructure failures (500)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::mailer::MailError;

/// Auth service error
///
/// Handlers return this directly; the `IntoResponse` impl in
/// `error::conversion` turns it into a JSON error body.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing request input
    #[error("{message}")]
    Validation { message: String },

    /// Unique-field collision (name or email already taken)
    #[error("{message}")]
    Duplicate { message: String },

    /// Bad credentials, bad signature, or expired token
    #[error("{message}")]
    Authentication { message: String },

    /// Authenticated but not allowed (inactive, unverified, wrong role)
    #[error("{message}")]
    Authorization { message: String },

    /// Account locked after too many failed logins
    #[error("{message}")]
    Locked { message: String },

    /// Referenced account does not exist
    #[error("{message}")]
    NotFound { message: String },

    /// Too many attempts for this client inside the window
    #[error("{message}")]
    RateLimited { message: String },

    /// Outbound email delivery failed
    #[error("email delivery failed: {0}")]
    Mail(#[from] MailError),

    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected internal failure (blocking task join, etc.)
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate { message: message.into() }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into() }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization { message: message.into() }
    }

    pub fn locked(message: impl Into<String>) -> Self {
        Self::Locked { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Authorization { .. } => StatusCode::FORBIDDEN,
            Self::Locked { .. } => StatusCode::LOCKED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Mail(_) | Self::Database(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message
    ///
    /// Infrastructure failures are replaced with a generic message so
    /// internals never leak into responses; the real error is logged
    /// by the response conversion.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Duplicate { message }
            | Self::Authentication { message }
            | Self::Authorization { message }
            | Self::Locked { message }
            | Self::NotFound { message }
            | Self::RateLimited { message } => message.clone(),
            Self::Mail(_) => "Unable to send email. Please try again later".to_string(),
            Self::Database(_) | Self::Internal { .. } => {
                "Server error. Please try again later".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            AuthError::validation("bad input").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::duplicate("name taken").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::authentication("bad credentials").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::authorization("not allowed").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::locked("locked").status_code(), StatusCode::LOCKED);
        assert_eq!(
            AuthError::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::rate_limited("slow down").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_message_passthrough() {
        let err = AuthError::authentication("Name or password is incorrect");
        assert_eq!(err.message(), "Name or password is incorrect");
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AuthError::internal("join error: task panicked");
        assert!(!err.message().contains("panicked"));
        assert_eq!(err.message(), "Server error. Please try again later");
    }

    #[test]
    fn test_database_message_is_generic() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.message(), "Server error. Please try again later");
    }
}
