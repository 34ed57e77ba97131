//! User profile domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use chalkboard_core::{CourseId, Email, Role, UserId};

use crate::firebase::Document;
use crate::models::parse_timestamp;

/// A user profile (`users/{uid}` document).
///
/// Keyed by the identity provider's UID. The role is assigned at account
/// creation and never changed by the application.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Identity provider UID (document ID).
    pub uid: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Profile photo URL, when one has been uploaded or supplied by a
    /// federated provider.
    pub photo_url: Option<String>,
    /// Teaching subject (educators).
    pub subject: Option<String>,
    /// Short biography (educators).
    pub bio: Option<String>,
    /// Courses the user is enrolled in (students).
    pub enrolled_courses: Vec<CourseId>,
    /// Creation timestamp, server-assigned.
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Decode a profile from its Firestore document.
    ///
    /// Returns `None` if the document is missing the fields every profile
    /// has (email, role); optional fields decode leniently.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let email = Email::parse(doc.str_field("email")?).ok()?;
        let role: Role = doc.str_field("role")?.parse().ok()?;

        let enrolled_courses = doc
            .array_field("enrolledCourses")
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(CourseId::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            uid: UserId::new(doc.id.clone()),
            name: doc.str_field("name").unwrap_or_default().to_owned(),
            email,
            role,
            photo_url: doc.str_field("photoURL").map(str::to_owned),
            subject: doc.str_field("subject").map(str::to_owned),
            bio: doc.str_field("bio").map(str::to_owned),
            enrolled_courses,
            created_at: parse_timestamp(
                doc.str_field("createdAt").or(doc.create_time.as_deref()),
            ),
        })
    }

    /// Field map for creating a fresh profile document.
    #[must_use]
    pub fn new_profile_fields(
        name: &str,
        email: &Email,
        role: Role,
        photo_url: Option<&str>,
        subject: Option<&str>,
        bio: Option<&str>,
    ) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".to_owned(), json!(name));
        fields.insert("email".to_owned(), json!(email.as_str()));
        fields.insert("role".to_owned(), json!(role.to_string()));
        fields.insert("photoURL".to_owned(), json!(photo_url.unwrap_or("")));
        if role == Role::Student {
            fields.insert("enrolledCourses".to_owned(), json!([]));
        }
        if let Some(subject) = subject {
            fields.insert("subject".to_owned(), json!(subject));
        }
        if let Some(bio) = bio {
            fields.insert("bio".to_owned(), json!(bio));
        }
        fields
    }
}
