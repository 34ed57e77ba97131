//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use chalkboard_core::{Email, Role, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. The
/// role rides along so the educator gate does not need a profile read on
/// every request; it cannot drift because roles never change after signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider UID.
    pub uid: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: Option<String>,
    /// Account role.
    pub role: Role,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
