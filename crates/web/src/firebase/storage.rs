//! Cloud Storage for Firebase REST client.
//!
//! Objects are uploaded with the `v0` simple-upload endpoint; the response
//! carries a download token from which the durable download URL is built.
//! Destination paths are namespaced per asset kind and owner via
//! [`StoragePath`] so one user's uploads can never collide with another's.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use chalkboard_core::{CourseId, UserId};

use crate::config::FirebaseConfig;

/// Errors that can occur when interacting with the Storage API.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Upload response carried no download token.
    #[error("upload response is missing a download token")]
    MissingToken,

    /// A download URL could not be mapped back to an object path.
    #[error("not a recognized download URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A namespaced object path inside the bucket.
///
/// Folder layout:
/// - `thumbnails/{uid}/{filename}` - course thumbnails
/// - `course-videos/{uid}/{filename}` - course intro videos
/// - `lessons/{courseId}/{filename}` - lesson videos
/// - `profile-photos/{uid}` - one photo per account, overwritten in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    /// Path for a course thumbnail.
    #[must_use]
    pub fn thumbnail(owner: &UserId, filename: &str) -> Self {
        Self(format!("thumbnails/{owner}/{filename}"))
    }

    /// Path for a course intro video.
    #[must_use]
    pub fn course_video(owner: &UserId, filename: &str) -> Self {
        Self(format!("course-videos/{owner}/{filename}"))
    }

    /// Path for a lesson video.
    #[must_use]
    pub fn lesson_video(course: &CourseId, filename: &str) -> Self {
        Self(format!("lessons/{course}/{filename}"))
    }

    /// Path for an account's profile photo.
    #[must_use]
    pub fn profile_photo(owner: &UserId) -> Self {
        Self(format!("profile-photos/{owner}"))
    }

    /// The object path as stored in the bucket.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A successfully uploaded object.
#[derive(Debug, Clone)]
pub struct UploadedObject {
    /// Object path inside the bucket.
    pub path: String,
    /// Durable, token-authenticated download URL.
    pub download_url: String,
}

/// Upload response metadata (subset we use).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Cloud Storage REST client.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    /// `{host}/v0/b/{bucket}/o`
    base_url: String,
    bucket: String,
    api_key: SecretString,
}

impl StorageClient {
    /// Create a new Storage client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/v0/b/{}/o", config.storage_host, config.storage_bucket),
            bucket: config.storage_bucket.clone(),
            api_key: config.web_api_key.clone(),
        }
    }

    /// Upload a binary object and return its durable download URL.
    ///
    /// This is a single-shot upload; completion or failure is all callers
    /// observe. Progress events are not surfaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails, the API rejects the object,
    /// or the response carries no download token.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedObject, StorageError> {
        let url = format!(
            "{}?name={}&key={}",
            self.base_url,
            urlencoding::encode(path.as_str()),
            self.api_key.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        let metadata: ObjectMetadata =
            serde_json::from_str(&text).map_err(|e| StorageError::Parse(e.to_string()))?;
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or(StorageError::MissingToken)?;

        Ok(UploadedObject {
            download_url: self.download_url(&metadata.name, token),
            path: metadata.name,
        })
    }

    /// Delete an object by its bucket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected or the transport fails.
    /// A missing object (404) is treated as already deleted.
    #[instrument(skip(self))]
    pub async fn delete_object(&self, object_path: &str) -> Result<(), StorageError> {
        let url = format!(
            "{}/{}?key={}",
            self.base_url,
            urlencoding::encode(object_path),
            self.api_key.expose_secret()
        );

        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(())
    }

    /// Delete an object addressed by a previously issued download URL.
    ///
    /// Documents store only the download URL, so deletion has to recover the
    /// object path from it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidUrl` if the URL is not a download URL
    /// for this bucket, or any delete error.
    #[instrument(skip(self))]
    pub async fn delete_by_url(&self, download_url: &str) -> Result<(), StorageError> {
        let path = object_path_from_url(download_url)
            .ok_or_else(|| StorageError::InvalidUrl(download_url.to_owned()))?;
        self.delete_object(&path).await
    }

    /// Build the token-authenticated download URL for an object.
    fn download_url(&self, object_path: &str, token: &str) -> String {
        format!(
            "{}/{}?alt=media&token={}",
            self.base_url,
            urlencoding::encode(object_path),
            token
        )
    }

    /// The bucket this client writes to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Extract the percent-decoded object path from a download URL.
///
/// Download URLs look like
/// `https://{host}/v0/b/{bucket}/o/{encoded-path}?alt=media&token=...`.
fn object_path_from_url(download_url: &str) -> Option<String> {
    let parsed = url::Url::parse(download_url).ok()?;
    let mut segments = parsed.path_segments()?;

    // Expect: v0 / b / {bucket} / o / {object}
    if segments.next() != Some("v0") || segments.next() != Some("b") {
        return None;
    }
    let _bucket = segments.next()?;
    if segments.next() != Some("o") {
        return None;
    }

    let encoded = segments.next()?;
    if encoded.is_empty() || segments.next().is_some() {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
