//! Authentication route handlers.
//!
//! Handlers exchange credentials with the identity provider via
//! [`AuthService`] and keep the resulting identity in the cookie session.
//! Role-gated rejections never establish a session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use chalkboard_core::{Role, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Student signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Federated login form data.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginForm {
    /// Google ID token obtained client-side.
    pub id_token: String,
}

/// Educator signup form data.
#[derive(Debug, Deserialize)]
pub struct EducatorSignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub subject: String,
    pub bio: String,
}

/// Identity returned to the client after a successful auth action.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub uid: UserId,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&CurrentUser> for AuthResponse {
    fn from(user: &CurrentUser) -> Self {
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Store the authenticated identity in the session.
async fn establish_session(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle student signup.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let user = auth
        .sign_up_student(&form.name, &form.email, &form.password)
        .await?;

    establish_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(&user))))
}

/// Handle student login.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let user = auth.login(&form.email, &form.password).await?;

    establish_session(&session, &user).await?;
    Ok(Json(AuthResponse::from(&user)))
}

/// Handle federated (Google) login.
pub async fn google_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<GoogleLoginForm>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let user = auth.login_with_google(&form.id_token).await?;

    establish_session(&session, &user).await?;
    Ok(Json(AuthResponse::from(&user)))
}

/// Handle educator signup.
pub async fn educator_signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<EducatorSignupForm>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let user = auth
        .sign_up_educator(
            &form.name,
            &form.email,
            &form.password,
            &form.subject,
            &form.bio,
        )
        .await?;

    establish_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(&user))))
}

/// Handle educator login.
///
/// Accounts without the educator role are rejected before any session is
/// established, so a student cannot reach the educator surface by logging
/// in here.
pub async fn educator_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.identity(), state.firestore());
    let user = auth.educator_login(&form.email, &form.password).await?;

    establish_session(&session, &user).await?;
    Ok(Json(AuthResponse::from(&user)))
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session clear failed: {e}")))?;
    Ok(StatusCode::NO_CONTENT)
}
