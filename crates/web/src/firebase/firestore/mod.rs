//! Cloud Firestore REST client.
//!
//! Documents live under
//! `projects/{project}/databases/(default)/documents/{path}`; collection
//! paths may be nested one level for subcollections
//! (`courses/{courseId}/lessons`). Creates go through `:commit` with a
//! client-generated document ID so a server-assigned timestamp transform can
//! ride along in the same write, which is how the official SDKs do it.

pub mod value;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;
use uuid::Uuid;

use crate::config::FirebaseConfig;

/// Errors that can occur when interacting with the Firestore API.
#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A decoded Firestore document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document ID (last path segment of the resource name).
    pub id: String,
    /// Decoded fields (plain JSON, not the wire encoding).
    pub fields: Map<String, Value>,
    /// Server-reported creation time (RFC 3339), when present.
    pub create_time: Option<String>,
}

impl Document {
    /// A string field, if present and a string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// An array field, if present and an array.
    #[must_use]
    pub fn array_field(&self, name: &str) -> Option<&Vec<Value>> {
        self.fields.get(name).and_then(Value::as_array)
    }

    /// A numeric field coerced to `f64`; absent or malformed values
    /// coerce to zero.
    #[must_use]
    pub fn number_field_or_zero(&self, name: &str) -> f64 {
        self.fields
            .get(name)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Firestore REST wire representation of a document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    create_time: Option<String>,
}

impl From<WireDocument> for Document {
    fn from(wire: WireDocument) -> Self {
        let id = wire
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            id,
            fields: value::decode_fields(&wire.fields),
            create_time: wire.create_time,
        }
    }
}

/// Cloud Firestore REST client.
#[derive(Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    /// `{host}/v1/projects/{p}/databases/(default)/documents`
    base_url: String,
    /// `projects/{p}/databases/(default)/documents` (resource-name prefix)
    name_prefix: String,
    api_key: SecretString,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let database = format!("projects/{}/databases/(default)", config.project_id);
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/v1/{database}/documents", config.firestore_host),
            name_prefix: format!("{database}/documents"),
            api_key: config.web_api_key.clone(),
        }
    }

    /// Create a document with a generated ID.
    ///
    /// When `server_time_field` is given, that field is populated by a
    /// `REQUEST_TIME` transform in the same write, so the timestamp is
    /// assigned by the store rather than this process.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is rejected or the transport fails.
    #[instrument(skip(self, fields))]
    pub async fn create_document(
        &self,
        collection_path: &str,
        fields: &Map<String, Value>,
        server_time_field: Option<&str>,
    ) -> Result<String, FirestoreError> {
        // Document IDs are generated client-side, like the official SDKs do.
        let id = Uuid::new_v4().simple().to_string();
        let name = format!("{}/{collection_path}/{id}", self.name_prefix);

        let mut write = json!({
            "update": {
                "name": name,
                "fields": value::encode_fields(fields),
            },
            "currentDocument": { "exists": false },
        });
        if let Some(field) = server_time_field {
            write["updateTransforms"] = json!([
                { "fieldPath": field, "setToServerValue": "REQUEST_TIME" }
            ]);
        }

        let url = format!(
            "{}:commit?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;

        check_status(response).await?;
        Ok(id)
    }

    /// Create or overwrite a document at a known ID (e.g. `users/{uid}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected or the transport fails.
    #[instrument(skip(self, fields))]
    pub async fn set_document(
        &self,
        collection_path: &str,
        id: &str,
        fields: &Map<String, Value>,
        server_time_field: Option<&str>,
    ) -> Result<(), FirestoreError> {
        let name = format!("{}/{collection_path}/{id}", self.name_prefix);

        let mut write = json!({
            "update": {
                "name": name,
                "fields": value::encode_fields(fields),
            },
        });
        if let Some(field) = server_time_field {
            write["updateTransforms"] = json!([
                { "fieldPath": field, "setToServerValue": "REQUEST_TIME" }
            ]);
        }

        let url = format!(
            "{}:commit?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Patch the given fields of an existing document, leaving the rest
    /// untouched (field-mask update).
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is rejected or the transport fails.
    #[instrument(skip(self, fields))]
    pub async fn update_fields(
        &self,
        collection_path: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), FirestoreError> {
        let url = format!(
            "{}/{collection_path}/{id}?key={}&{}",
            self.base_url,
            self.api_key.expose_secret(),
            value::update_mask_query(fields),
        );

        let response = self
            .client
            .patch(&url)
            .json(&json!({ "fields": value::encode_fields(fields) }))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Fetch a document; `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than a missing document.
    #[instrument(skip(self))]
    pub async fn get_document(
        &self,
        collection_path: &str,
        id: &str,
    ) -> Result<Option<Document>, FirestoreError> {
        let url = format!(
            "{}/{collection_path}/{id}?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = check_status(response).await?;
        let wire: WireDocument =
            serde_json::from_str(&text).map_err(|e| FirestoreError::Parse(e.to_string()))?;
        Ok(Some(wire.into()))
    }

    /// List all documents in a collection (used for lesson subcollections).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_documents(
        &self,
        collection_path: &str,
    ) -> Result<Vec<Document>, FirestoreError> {
        #[derive(Debug, Deserialize)]
        struct ListResponse {
            #[serde(default)]
            documents: Vec<WireDocument>,
        }

        let url = format!(
            "{}/{collection_path}?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let response = self.client.get(&url).send().await?;
        let text = check_status(response).await?;
        let parsed: ListResponse =
            serde_json::from_str(&text).map_err(|e| FirestoreError::Parse(e.to_string()))?;
        Ok(parsed.documents.into_iter().map(Into::into).collect())
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected or the transport fails.
    #[instrument(skip(self))]
    pub async fn delete_document(
        &self,
        collection_path: &str,
        id: &str,
    ) -> Result<(), FirestoreError> {
        let url = format!(
            "{}/{collection_path}/{id}?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let response = self.client.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// Query a top-level collection for documents where `field == value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(skip(self, equals))]
    pub async fn query_equal(
        &self,
        collection_id: &str,
        field: &str,
        equals: &Value,
    ) -> Result<Vec<Document>, FirestoreError> {
        #[derive(Debug, Deserialize)]
        struct QueryRow {
            document: Option<WireDocument>,
        }

        let url = format!(
            "{}:runQuery?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": value::encode(equals),
                    }
                },
            }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let text = check_status(response).await?;

        // :runQuery streams rows; the final row may carry only readTime.
        let rows: Vec<QueryRow> =
            serde_json::from_str(&text).map_err(|e| FirestoreError::Parse(e.to_string()))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document.map(Into::into))
            .collect())
    }
}

/// Reject non-success responses, returning the body text on success.
async fn check_status(response: reqwest::Response) -> Result<String, FirestoreError> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Firestore returned non-success status"
        );
        return Err(FirestoreError::Api {
            status: status.as_u16(),
            message: text.chars().take(200).collect(),
        });
    }

    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_document_id_from_name() {
        let wire = WireDocument {
            name: "projects/p/databases/(default)/documents/courses/c-123".to_string(),
            fields: Map::new(),
            create_time: Some("2025-11-03T10:15:30Z".to_string()),
        };
        let doc: Document = wire.into();
        assert_eq!(doc.id, "c-123");
    }

    #[test]
    fn test_wire_document_fields_are_decoded() {
        let raw = serde_json::json!({
            "name": "projects/p/databases/(default)/documents/courses/c-1",
            "fields": {
                "title": { "stringValue": "Intro to Rust" },
                "price": { "doubleValue": 49.0 },
                "students": { "arrayValue": { "values": [ { "stringValue": "u1" } ] } }
            }
        });
        let wire: WireDocument = serde_json::from_value(raw).unwrap();
        let doc: Document = wire.into();
        assert_eq!(doc.str_field("title"), Some("Intro to Rust"));
        assert!((doc.number_field_or_zero("price") - 49.0).abs() < f64::EPSILON);
        assert_eq!(doc.array_field("students").unwrap().len(), 1);
    }

    #[test]
    fn test_number_field_or_zero_coerces_garbage() {
        let doc = Document {
            id: "x".to_string(),
            fields: serde_json::json!({ "rating": "not a number" })
                .as_object()
                .cloned()
                .unwrap(),
            create_time: None,
        };
        assert!((doc.number_field_or_zero("rating") - 0.0).abs() < f64::EPSILON);
        assert!((doc.number_field_or_zero("missing") - 0.0).abs() < f64::EPSILON);
    }
}
