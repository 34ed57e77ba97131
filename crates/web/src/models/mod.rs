//! Domain model types.
//!
//! These types represent validated domain objects decoded from Firestore
//! documents, separate from the wire encoding handled by the Firestore
//! client.

pub mod course;
pub mod session;
pub mod user;

pub use course::{Course, Lesson};
pub use session::{CurrentUser, keys as session_keys};
pub use user::UserProfile;

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp field, tolerating absence and garbage.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
