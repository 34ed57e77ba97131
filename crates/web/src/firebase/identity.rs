//! Identity Toolkit REST client.
//!
//! Wraps the `accounts:*` endpoints used for email/password and federated
//! sign-in. The client never stores credentials; it exchanges them for the
//! caller and returns the account attributes the rest of the crate needs.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use chalkboard_core::{Email, UserId};

use crate::config::FirebaseConfig;

/// Errors that can occur when interacting with the Identity Toolkit API.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email is already registered.
    #[error("email already registered")]
    EmailExists,

    /// Wrong email/password combination or unknown account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password rejected by the identity provider.
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// The account has been disabled by an administrator.
    #[error("account disabled")]
    UserDisabled,

    /// Any other API error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An authenticated account as reported by the identity provider.
///
/// Carries the opaque UID the document store keys profiles by, plus the
/// optional display attributes federated providers supply.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity provider UID (`localId`).
    pub uid: UserId,
    /// Account email.
    pub email: Email,
    /// Display name, if the provider has one.
    pub display_name: Option<String>,
    /// Profile photo URL, if the provider has one.
    pub photo_url: Option<String>,
    /// Short-lived ID token for follow-up `accounts:*` calls.
    pub id_token: SecretString,
}

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

/// Response body shared by the sign-up and sign-in endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    id_token: String,
}

/// Error envelope returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl IdentityClient {
    /// Create a new Identity Toolkit client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/v1", config.identity_host),
            api_key: config.web_api_key.clone(),
        }
    }

    /// Create a new email/password account.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmailExists` if the address is taken and
    /// `IdentityError::WeakPassword` if the provider rejects the password.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError> {
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        self.account_call("accounts:signUp", &body).await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` for a wrong password or
    /// unknown account.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthUser, IdentityError> {
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        self.account_call("accounts:signInWithPassword", &body).await
    }

    /// Sign in with a federated identity provider credential.
    ///
    /// `provider_token` is the OAuth ID token obtained client-side (e.g. from
    /// Google Sign-In); the identity provider verifies it and returns the
    /// linked account.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` if the provider rejects
    /// the credential.
    #[instrument(skip(self, provider_token))]
    pub async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        provider_token: &str,
    ) -> Result<AuthUser, IdentityError> {
        let body = json!({
            "postBody": format!(
                "id_token={}&providerId={}",
                urlencoding::encode(provider_token),
                urlencoding::encode(provider_id)
            ),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        self.account_call("accounts:signInWithIdp", &body).await
    }

    /// Update the account's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, id_token))]
    pub async fn update_profile(
        &self,
        id_token: &SecretString,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let body = json!({
            "idToken": id_token.expose_secret(),
            "displayName": display_name,
            "returnSecureToken": false,
        });

        let response = self
            .client
            .post(self.endpoint("accounts:update"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(decode_error(status, &response.text().await.unwrap_or_default()));
        }

        Ok(())
    }

    /// Look up the account behind an ID token (current-user accessor).
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` if the token no longer
    /// resolves to an account.
    #[instrument(skip(self, id_token))]
    pub async fn lookup(&self, id_token: &SecretString) -> Result<AuthUser, IdentityError> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupResponse {
            users: Vec<LookupUser>,
        }

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupUser {
            local_id: String,
            email: Option<String>,
            display_name: Option<String>,
            photo_url: Option<String>,
        }

        let body = json!({ "idToken": id_token.expose_secret() });

        let response = self
            .client
            .post(self.endpoint("accounts:lookup"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(decode_error(status, &text));
        }

        let parsed: LookupResponse =
            serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))?;
        let user = parsed
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::InvalidCredentials)?;

        Ok(AuthUser {
            uid: UserId::new(user.local_id),
            email: parse_email(user.email.as_deref())?,
            display_name: user.display_name,
            photo_url: user.photo_url,
            id_token: id_token.clone(),
        })
    }

    /// POST to an `accounts:*` endpoint and decode the sign-in response.
    async fn account_call(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<AuthUser, IdentityError> {
        let response = self
            .client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(decode_error(status, &text));
        }

        let parsed: SignInResponse =
            serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))?;

        Ok(AuthUser {
            uid: UserId::new(parsed.local_id),
            email: parse_email(parsed.email.as_deref())?,
            display_name: parsed.display_name,
            photo_url: parsed.photo_url,
            id_token: SecretString::from(parsed.id_token),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/{}?key={}",
            self.base_url,
            method,
            self.api_key.expose_secret()
        )
    }
}

fn parse_email(email: Option<&str>) -> Result<Email, IdentityError> {
    let raw = email.ok_or_else(|| {
        IdentityError::Parse("identity response is missing the account email".to_string())
    })?;
    Email::parse(raw).map_err(|e| IdentityError::Parse(e.to_string()))
}

/// Map an API error body onto a typed error.
///
/// The API reports failures as `{"error": {"message": "EMAIL_EXISTS"}}` with
/// an HTTP 400; the message code is the only reliable discriminator.
fn decode_error(status: StatusCode, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    let code = message.split(&[' ', ':'][..]).next().unwrap_or("");
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
        | "INVALID_IDP_RESPONSE" | "USER_NOT_FOUND" | "INVALID_ID_TOKEN" => {
            IdentityError::InvalidCredentials
        }
        "WEAK_PASSWORD" => IdentityError::WeakPassword(message),
        "USER_DISABLED" => IdentityError::UserDisabled,
        _ => IdentityError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
