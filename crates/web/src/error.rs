//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::{AuthError, CatalogError, PublishError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Upload-and-link workflow failed.
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error means an upstream service failed (worth capturing).
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Auth(AuthError::Identity(_) | AuthError::Persistence(_))
                | Self::Publish(
                    PublishError::Upload(_)
                        | PublishError::Persistence(_)
                        | PublishError::BlobDelete(_)
                )
                | Self::Catalog(CatalogError::Persistence(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::RoleDenied => StatusCode::FORBIDDEN,
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Identity(_) | AuthError::Persistence(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Publish(err) => match err {
                PublishError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PublishError::Upload(_)
                | PublishError::Persistence(_)
                | PublishError::BlobDelete(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Persistence(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::EmailTaken => {
                    "An account with this email already exists".to_string()
                }
                AuthError::RoleDenied => "Access denied. Not an educator account".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Identity(_) | AuthError::Persistence(_) => {
                    "External service error".to_string()
                }
            },
            Self::Publish(err) => match err {
                PublishError::Validation { field } => {
                    format!("Please fill all required fields ({field})")
                }
                PublishError::Upload(_) => "Upload failed, please try again".to_string(),
                PublishError::Persistence(_) | PublishError::BlobDelete(_) => {
                    "External service error".to_string()
                }
            },
            Self::Catalog(CatalogError::Persistence(_)) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
