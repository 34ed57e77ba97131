//! Authentication error types.

use thiserror::Error;

use crate::firebase::{FirestoreError, IdentityError};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] chalkboard_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Password rejected by the identity provider.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The account exists but does not hold the required role.
    #[error("account does not have the required role")]
    RoleDenied,

    /// Identity provider error (transport or unexpected response).
    #[error("identity provider error: {0}")]
    Identity(IdentityError),

    /// Profile document read/write failed.
    #[error("profile store error: {0}")]
    Persistence(#[from] FirestoreError),
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailExists => Self::EmailTaken,
            IdentityError::InvalidCredentials | IdentityError::UserDisabled => {
                Self::InvalidCredentials
            }
            IdentityError::WeakPassword(msg) => Self::WeakPassword(msg),
            other => Self::Identity(other),
        }
    }
}
