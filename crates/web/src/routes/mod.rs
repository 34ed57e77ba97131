//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check
//!
//! # Auth
//! POST /auth/signup                - Student signup
//! POST /auth/login                 - Student login (creates profile if absent)
//! POST /auth/google                - Federated login (Google ID token)
//! POST /auth/educator/signup       - Educator signup
//! POST /auth/educator/login        - Educator login (role gate)
//! POST /auth/logout                - Logout action
//!
//! # Catalog
//! GET  /courses                    - Public course listing
//! GET  /courses/{id}               - Course detail with lessons
//! POST /courses/{id}/enroll        - Enroll (requires auth)
//!
//! # Student dashboard (requires auth)
//! GET  /dashboard                  - Profile and enrolled courses
//!
//! # Educator surface (requires educator role)
//! GET    /educator/dashboard       - Courses plus analytics summary
//! POST   /educator/courses         - Create course (multipart)
//! PUT    /educator/courses/{id}    - Update course scalars
//! DELETE /educator/courses/{id}    - Delete course
//! POST   /educator/courses/{id}/lessons            - Create lesson (multipart)
//! DELETE /educator/courses/{id}/lessons/{lessonId} - Delete lesson
//! GET    /educator/profile         - Fetch own profile
//! PUT    /educator/profile         - Update profile (multipart)
//! ```

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod educator;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google_login))
        .route("/educator/signup", post(auth::educator_signup))
        .route("/educator/login", post(auth::educator_login))
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/{id}", get(catalog::show))
        .route("/{id}/enroll", post(catalog::enroll))
}

/// Create the educator routes router.
pub fn educator_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/dashboard", get(educator::dashboard))
        .route("/courses", post(educator::create_course))
        .route(
            "/courses/{id}",
            put(educator::update_course).delete(educator::delete_course),
        )
        .route("/courses/{id}/lessons", post(educator::create_lesson))
        .route(
            "/courses/{id}/lessons/{lesson_id}",
            delete(educator::delete_lesson),
        )
        .route(
            "/profile",
            get(educator::profile).put(educator::update_profile),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth routes
        .nest("/auth", auth_routes())
        // Catalog routes
        .nest("/courses", catalog_routes())
        // Student dashboard
        .route("/dashboard", get(dashboard::index))
        // Educator surface
        .nest("/educator", educator_routes())
}
