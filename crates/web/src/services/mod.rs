//! Application services.
//!
//! - [`auth`] - signup, login, and the educator role gate
//! - [`publish`] - the upload-and-link workflow behind every asset-bearing
//!   mutation
//! - [`catalog`] - course/lesson reads and enrollment
//! - [`analytics`] - the educator dashboard reduction

pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod publish;

pub use analytics::DashboardSummary;
pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogService};
pub use publish::{Attachment, PublishError, PublishService};
