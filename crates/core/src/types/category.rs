//! Course categories.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown category string.
#[derive(thiserror::Error, Debug, Clone)]
#[error("invalid course category: {0}")]
pub struct CategoryError(pub String);

/// Course category, from the marketplace's fixed set.
///
/// Stored in documents as the display string (e.g. `"Web Development"`), the
/// same values the catalog filter offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseCategory {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    Programming,
    Design,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
}

impl CourseCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::WebDevelopment,
        Self::Programming,
        Self::Design,
        Self::DataScience,
        Self::Business,
    ];

    /// The display string, as stored in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebDevelopment => "Web Development",
            Self::Programming => "Programming",
            Self::Design => "Design",
            Self::DataScience => "Data Science",
            Self::Business => "Business",
        }
    }
}

impl std::fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CourseCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CategoryError(s.to_owned()))
    }
}
