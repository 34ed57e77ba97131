//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role string.
#[derive(thiserror::Error, Debug, Clone)]
#[error("invalid role: {0}")]
pub struct RoleError(pub String);

/// Account role, assigned at signup and never changed by the application.
///
/// The two roles are mutually exclusive and gate dashboard access: students
/// reach the learning dashboard, educators the course-management dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses and enrolls in courses.
    #[default]
    Student,
    /// Creates and manages courses and lessons.
    Educator,
}

impl Role {
    /// Whether this role may use the educator surface.
    #[must_use]
    pub const fn is_educator(self) -> bool {
        matches!(self, Self::Educator)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Educator => write!(f, "educator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "educator" => Ok(Self::Educator),
            other => Err(RoleError(other.to_owned())),
        }
    }
}
