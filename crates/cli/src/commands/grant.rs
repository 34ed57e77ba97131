//! Grant the educator role to an existing account.
//!
//! The application never changes a role after signup; this is the operator
//! override for accounts that signed up through the student flow and later
//! became educators.

use serde_json::{Map, json};
use thiserror::Error;
use tracing::info;

use chalkboard_core::Role;
use chalkboard_web::config::FirebaseConfig;
use chalkboard_web::firebase::{FirestoreClient, FirestoreError};

/// Errors that can occur while granting a role.
#[derive(Debug, Error)]
pub enum GrantError {
    /// No profile document matches the email.
    #[error("No account found with email: {0}")]
    AccountNotFound(String),

    /// Document store operation failed.
    #[error("Document store error: {0}")]
    Persistence(#[from] FirestoreError),
}

/// Rewrite the profile's role field to `educator`.
///
/// # Errors
///
/// Returns an error if configuration is missing, no profile matches the
/// email, or the write fails.
pub async fn educator_role(email: &str, subject: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = FirebaseConfig::from_env()?;
    let firestore = FirestoreClient::new(&config);

    let matches = firestore
        .query_equal("users", "email", &json!(email))
        .await
        .map_err(GrantError::Persistence)?;
    let profile = matches
        .first()
        .ok_or_else(|| GrantError::AccountNotFound(email.to_string()))?;

    if profile.str_field("role") == Some(Role::Educator.to_string().as_str()) {
        info!(uid = %profile.id, "account already has the educator role");
        return Ok(());
    }

    let mut fields = Map::new();
    fields.insert("role".to_owned(), json!(Role::Educator.to_string()));
    if !subject.is_empty() {
        fields.insert("subject".to_owned(), json!(subject));
    }
    firestore
        .update_fields("users", &profile.id, &fields)
        .await
        .map_err(GrantError::Persistence)?;

    info!(uid = %profile.id, "educator role granted");
    Ok(())
}
