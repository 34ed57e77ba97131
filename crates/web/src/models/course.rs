//! Course and lesson domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use chalkboard_core::{CourseCategory, CourseId, LessonId, Price, UserId};

use crate::firebase::Document;
use crate::models::parse_timestamp;

/// A course (`courses/{id}` document).
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    /// Document ID.
    pub id: CourseId,
    /// Owning educator's UID.
    pub educator_id: UserId,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Price; malformed stored values coerce to zero.
    pub price: Price,
    /// Category; unknown stored values decode to `None` rather than
    /// failing the whole read.
    pub category: Option<CourseCategory>,
    /// Thumbnail download URL, when one was uploaded.
    pub thumbnail_url: Option<String>,
    /// Intro-video download URL, when one was uploaded.
    pub video_url: Option<String>,
    /// Enrolled student UIDs.
    pub students: Vec<UserId>,
    /// Average review rating; absent means not yet rated (reads as 0).
    pub rating: f64,
    /// Creation timestamp, server-assigned.
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    /// Decode a course from its Firestore document.
    ///
    /// Returns `None` only when the owning educator is missing - a course
    /// without an owner is unusable. Everything else decodes leniently.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let educator_id = UserId::new(doc.str_field("educatorId")?);

        let students = doc
            .array_field("students")
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(UserId::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id: CourseId::new(doc.id.clone()),
            educator_id,
            title: doc.str_field("title").unwrap_or_default().to_owned(),
            description: doc.str_field("description").unwrap_or_default().to_owned(),
            price: doc
                .fields
                .get("price")
                .map(Price::coerce)
                .unwrap_or_default(),
            category: doc
                .str_field("category")
                .and_then(|s| s.parse().ok()),
            thumbnail_url: non_empty(doc.str_field("thumbnail")),
            video_url: non_empty(doc.str_field("videoUrl")),
            students,
            rating: doc.number_field_or_zero("rating"),
            created_at: parse_timestamp(
                doc.str_field("createdAt").or(doc.create_time.as_deref()),
            ),
        })
    }

    /// Number of enrolled students.
    #[must_use]
    pub fn enrollment_count(&self) -> usize {
        self.students.len()
    }
}

/// A lesson (`courses/{courseId}/lessons/{id}` document).
///
/// Lessons are always addressed through their parent course; the type does
/// not carry the course ID because every caller already has it.
#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    /// Document ID within the parent course's subcollection.
    pub id: LessonId,
    /// Lesson title.
    pub title: String,
    /// Lesson description.
    pub description: String,
    /// Video download URL.
    pub video_url: Option<String>,
    /// Creation timestamp, server-assigned.
    pub created_at: Option<DateTime<Utc>>,
}

impl Lesson {
    /// Decode a lesson from its Firestore document.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: LessonId::new(doc.id.clone()),
            title: doc.str_field("title").unwrap_or_default().to_owned(),
            description: doc.str_field("description").unwrap_or_default().to_owned(),
            video_url: non_empty(doc.str_field("videoUrl")),
            created_at: parse_timestamp(
                doc.str_field("createdAt").or(doc.create_time.as_deref()),
            ),
        }
    }
}

/// Treat empty strings as absent; early records stored `""` for missing
/// attachments.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}
