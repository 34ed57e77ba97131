//! Educator surface route handlers.
//!
//! Everything here sits behind [`RequireEducator`]; course and lesson
//! mutations additionally verify that the course belongs to the caller.
//! Multipart submissions feed the upload-and-link workflow in
//! [`crate::services::publish`].

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use chalkboard_core::{CourseId, LessonId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::RequireEducator;
use crate::models::{Course, UserProfile};
use crate::services::publish::{CourseDraft, LessonDraft, ProfileUpdate};
use crate::services::{Attachment, AuthService, DashboardSummary, PublishService};
use crate::state::AppState;

// =============================================================================
// Payload Types
// =============================================================================

/// Educator dashboard payload.
#[derive(Debug, Serialize)]
pub struct EducatorDashboard {
    pub analytics: DashboardSummary,
    pub courses: Vec<Course>,
}

/// Course update form (scalar fields only).
#[derive(Debug, Deserialize)]
pub struct CourseForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
}

/// Response carrying a freshly created document ID.
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T> {
    pub id: T,
}

// =============================================================================
// Multipart intake
// =============================================================================

/// A multipart submission split into text fields and file attachments.
#[derive(Debug, Default)]
struct FormData {
    text: HashMap<String, String>,
    files: HashMap<String, Attachment>,
}

impl FormData {
    fn text(&self, name: &str) -> String {
        self.text.get(name).cloned().unwrap_or_default()
    }

    fn file(&mut self, name: &str) -> Option<Attachment> {
        self.files.remove(name)
    }
}

/// Drain a multipart body into memory.
///
/// Fields with a file name become [`Attachment`]s; the rest are text.
async fn read_form(mut multipart: Multipart) -> Result<FormData> {
    let mut form = FormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_owned) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
            // Empty file inputs submit a part with no name and no bytes.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            form.files.insert(
                name,
                Attachment {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read field: {e}")))?;
            form.text.insert(name, value);
        }
    }

    Ok(form)
}

/// Load a course and verify the caller owns it.
async fn owned_course(state: &AppState, owner: &UserId, id: &CourseId) -> Result<Course> {
    let course = state.catalog().get_course(id).await?;
    if &course.educator_id != owner {
        return Err(AppError::Forbidden(
            "course belongs to another educator".to_string(),
        ));
    }
    Ok(course)
}

// =============================================================================
// Dashboard
// =============================================================================

/// Show the educator dashboard: own courses plus the analytics summary.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
) -> Result<Json<EducatorDashboard>> {
    let courses = state.catalog().courses_by_educator(&user.uid).await?;
    let analytics = DashboardSummary::from_courses(&courses);
    Ok(Json(EducatorDashboard { analytics, courses }))
}

// =============================================================================
// Courses
// =============================================================================

/// Create a course from a multipart submission.
pub async fn create_course(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedResponse<CourseId>>)> {
    let mut form = read_form(multipart).await?;
    let draft = CourseDraft {
        title: form.text("title"),
        description: form.text("description"),
        price: form.text("price"),
        category: form.text("category"),
    };
    let thumbnail = form.file("thumbnail");
    let video = form.file("video");

    let publish = PublishService::new(state.firestore(), state.storage());
    let id = publish
        .create_course(&user, &draft, thumbnail, video)
        .await?;
    state.catalog().invalidate_listing().await;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Update a course's scalar fields.
pub async fn update_course(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    Path(id): Path<String>,
    Json(form): Json<CourseForm>,
) -> Result<StatusCode> {
    let id = CourseId::new(id);
    owned_course(&state, &user.uid, &id).await?;

    let draft = CourseDraft {
        title: form.title,
        description: form.description,
        price: form.price,
        category: form.category,
    };
    let publish = PublishService::new(state.firestore(), state.storage());
    publish.update_course(&id, &draft).await?;
    state.catalog().invalidate_listing().await;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a course (document first, then its blobs).
pub async fn delete_course(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = CourseId::new(id);
    let course = owned_course(&state, &user.uid, &id).await?;

    let publish = PublishService::new(state.firestore(), state.storage());
    publish.delete_course(&course).await?;
    state.catalog().invalidate_listing().await;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Lessons
// =============================================================================

/// Add a lesson to an owned course from a multipart submission.
pub async fn create_lesson(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedResponse<LessonId>>)> {
    let id = CourseId::new(id);
    owned_course(&state, &user.uid, &id).await?;

    let mut form = read_form(multipart).await?;
    let draft = LessonDraft {
        title: form.text("title"),
        description: form.text("description"),
    };
    let video = form.file("video");

    let publish = PublishService::new(state.firestore(), state.storage());
    let lesson_id = publish.add_lesson(&id, &draft, video).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: lesson_id }),
    ))
}

/// Delete a lesson (document first, then its video blob).
pub async fn delete_lesson(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    Path((id, lesson_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let id = CourseId::new(id);
    let lesson_id = LessonId::new(lesson_id);
    owned_course(&state, &user.uid, &id).await?;

    let lesson = state.catalog().get_lesson(&id, &lesson_id).await?;
    let publish = PublishService::new(state.firestore(), state.storage());
    publish.delete_lesson(&id, &lesson).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Profile
// =============================================================================

/// Fetch the educator's own profile.
pub async fn profile(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
) -> Result<Json<UserProfile>> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let profile = auth
        .fetch_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
    Ok(Json(profile))
}

/// Update the educator's profile (optionally replacing the photo).
pub async fn update_profile(
    State(state): State<AppState>,
    RequireEducator(user): RequireEducator,
    multipart: Multipart,
) -> Result<StatusCode> {
    let mut form = read_form(multipart).await?;
    let update = ProfileUpdate {
        name: form.text("name"),
        subject: form.text("subject"),
        bio: form.text("bio"),
    };
    let photo = form.file("photo");

    let publish = PublishService::new(state.firestore(), state.storage());
    publish.update_profile(&user, &update, photo).await?;

    Ok(StatusCode::NO_CONTENT)
}
