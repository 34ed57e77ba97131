//! Authentication service.
//!
//! Orchestrates the identity provider and the profile store: signup writes
//! the `users/{uid}` document right after the account is created, login
//! backfills a missing profile (federated sign-ins arrive without one), and
//! the educator login additionally gates on the stored role.
//!
//! The service returns a [`CurrentUser`] for the caller to place in the
//! session; it never touches the session itself.

mod error;

pub use error::AuthError;

use secrecy::SecretString;
use tracing::instrument;

use chalkboard_core::{Email, Role, UserId};

use crate::firebase::{AuthUser, FirestoreClient, IdentityClient};
use crate::models::{CurrentUser, UserProfile};

/// Google's federated provider ID.
const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Fallback display name for accounts created without one.
const DEFAULT_NAME: &str = "New User";

/// Authentication service.
pub struct AuthService<'a> {
    identity: &'a IdentityClient,
    firestore: &'a FirestoreClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(identity: &'a IdentityClient, firestore: &'a FirestoreClient) -> Self {
        Self {
            identity,
            firestore,
        }
    }

    // =========================================================================
    // Signup
    // =========================================================================

    /// Register a student account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address,
    /// `AuthError::EmailTaken` if the address is registered, and
    /// `AuthError::WeakPassword` if the provider rejects the password.
    #[instrument(skip(self, password))]
    pub async fn sign_up_student(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        self.sign_up(name, email, password, Role::Student, None, None)
            .await
    }

    /// Register an educator account with subject and bio.
    ///
    /// # Errors
    ///
    /// As [`Self::sign_up_student`].
    #[instrument(skip(self, password))]
    pub async fn sign_up_educator(
        &self,
        name: &str,
        email: &str,
        password: &str,
        subject: &str,
        bio: &str,
    ) -> Result<CurrentUser, AuthError> {
        self.sign_up(name, email, password, Role::Educator, Some(subject), Some(bio))
            .await
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        subject: Option<&str>,
        bio: Option<&str>,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let account = self.identity.sign_up(&email, password).await?;

        // Push the display name back to the identity provider so federated
        // metadata stays consistent with the profile document.
        self.identity
            .update_profile(&account.id_token, name)
            .await?;

        let fields = UserProfile::new_profile_fields(name, &email, role, None, subject, bio);
        self.firestore
            .set_document("users", account.uid.as_str(), &fields, Some("createdAt"))
            .await?;

        Ok(CurrentUser {
            uid: account.uid,
            email,
            name: Some(name.to_owned()),
            role,
        })
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with email and password.
    ///
    /// Accounts without a profile document get one created with the default
    /// `student` role, mirroring first-time federated sign-ins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email/password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let account = self.identity.sign_in_with_password(&email, password).await?;
        self.ensure_profile(&account).await
    }

    /// Login with a Google ID token (federated sign-in).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the provider rejects the
    /// token.
    #[instrument(skip(self, provider_token))]
    pub async fn login_with_google(&self, provider_token: &str) -> Result<CurrentUser, AuthError> {
        let account = self
            .identity
            .sign_in_with_idp(GOOGLE_PROVIDER_ID, provider_token)
            .await?;
        self.ensure_profile(&account).await
    }

    /// Educator login: authenticate, then gate on the stored role.
    ///
    /// A non-educator account is rejected with `AuthError::RoleDenied` and
    /// no session identity is returned, so the caller has nothing to
    /// establish a session from.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` or `AuthError::RoleDenied`.
    #[instrument(skip(self, password))]
    pub async fn educator_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let account = self.identity.sign_in_with_password(&email, password).await?;

        let profile = self
            .fetch_profile(&account.uid)
            .await?
            .ok_or(AuthError::RoleDenied)?;
        if !profile.role.is_educator() {
            tracing::warn!(uid = %account.uid, "educator login rejected for non-educator account");
            return Err(AuthError::RoleDenied);
        }

        Ok(CurrentUser {
            uid: profile.uid,
            email: profile.email,
            name: Some(profile.name),
            role: profile.role,
        })
    }

    /// Re-resolve a session user from an ID token (current-user accessor).
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` if the token no longer resolves.
    #[instrument(skip(self, id_token))]
    pub async fn current_user(&self, id_token: &SecretString) -> Result<CurrentUser, AuthError> {
        let account = self.identity.lookup(id_token).await?;
        self.ensure_profile(&account).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Fetch a profile document by UID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Persistence` if the read fails.
    pub async fn fetch_profile(&self, uid: &UserId) -> Result<Option<UserProfile>, AuthError> {
        let doc = self.firestore.get_document("users", uid.as_str()).await?;
        Ok(doc.as_ref().and_then(UserProfile::from_document))
    }

    /// Return the session identity for an authenticated account, creating
    /// the profile document on first contact.
    async fn ensure_profile(&self, account: &AuthUser) -> Result<CurrentUser, AuthError> {
        if let Some(profile) = self.fetch_profile(&account.uid).await? {
            return Ok(CurrentUser {
                uid: profile.uid,
                email: profile.email,
                name: Some(profile.name),
                role: profile.role,
            });
        }

        let name = account
            .display_name
            .clone()
            .unwrap_or_else(|| DEFAULT_NAME.to_owned());
        let fields = UserProfile::new_profile_fields(
            &name,
            &account.email,
            Role::Student,
            account.photo_url.as_deref(),
            None,
            None,
        );
        self.firestore
            .set_document("users", account.uid.as_str(), &fields, Some("createdAt"))
            .await?;

        tracing::info!(uid = %account.uid, "profile created on first login");
        Ok(CurrentUser {
            uid: account.uid.clone(),
            email: account.email.clone(),
            name: Some(name),
            role: Role::Student,
        })
    }
}
