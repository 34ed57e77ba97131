//! Public catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use chalkboard_core::CourseId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Course, Lesson};
use crate::state::AppState;

/// Course detail with its lessons.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

/// List all courses (cached).
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    let courses = state.catalog().list_courses().await?;
    Ok(Json(courses.as_ref().clone()))
}

/// Show one course with its lessons.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>> {
    let id = CourseId::new(id);
    let course = state.catalog().get_course(&id).await?;
    let lessons = state.catalog().list_lessons(&id).await?;
    Ok(Json(CourseDetail { course, lessons }))
}

/// Enroll the logged-in user in a course.
pub async fn enroll(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = CourseId::new(id);
    state.catalog().enroll(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
