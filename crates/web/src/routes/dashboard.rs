//! Student dashboard route handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Course, UserProfile};
use crate::services::AuthService;
use crate::state::AppState;

/// Student dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub profile: UserProfile,
    pub enrolled: Vec<Course>,
}

/// Show the logged-in user's profile and enrolled courses.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DashboardView>> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let profile = auth
        .fetch_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;

    // Stale enrollment references (deleted courses) are skipped, not errors.
    let mut enrolled = Vec::with_capacity(profile.enrolled_courses.len());
    for course_id in &profile.enrolled_courses {
        if let Ok(course) = state.catalog().get_course(course_id).await {
            enrolled.push(course);
        }
    }

    Ok(Json(DashboardView { profile, enrolled }))
}
