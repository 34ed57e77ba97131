#![allow(dead_code)] // each test target uses a different slice of the fake

//! In-process fake of the three Firebase surfaces.
//!
//! Binds an axum server on an ephemeral port that speaks just enough of the
//! Identity Toolkit, Firestore, and Storage REST protocols for the services
//! under test, while recording every state-changing call in order. Tests
//! point the real clients at it via the `FirebaseConfig` host overrides.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Map, Value, json};

use chalkboard_web::config::FirebaseConfig;
use chalkboard_web::firebase::firestore::value;

/// The project/bucket identifiers the fake serves.
pub const PROJECT_ID: &str = "demo";
pub const BUCKET: &str = "demo.appspot.com";

/// A recorded state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// Blob upload (Storage POST).
    Upload,
    /// Document write via `:commit`.
    Commit,
    /// Document field patch.
    Patch,
    /// Document delete.
    DeleteDocument,
    /// Blob delete (Storage DELETE).
    DeleteBlob,
}

/// One recorded call, in arrival order.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    /// Object path (uploads/blob deletes) or document path.
    pub path: String,
}

#[derive(Default)]
struct FakeState {
    /// State-changing calls, in order.
    calls: Mutex<Vec<Call>>,
    /// Documents by relative path (`courses/c-1`), wire-encoded fields.
    docs: Mutex<HashMap<String, Value>>,
    /// Accounts by email: (password, uid).
    accounts: Mutex<HashMap<String, (String, String)>>,
    /// Fail uploads whose object path contains this substring.
    fail_uploads_matching: Mutex<Option<String>>,
    /// Fail every blob delete.
    fail_blob_deletes: Mutex<bool>,
    uid_counter: AtomicUsize,
}

/// Handle to a running fake backend.
pub struct FakeFirebase {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeFirebase {
    /// Bind and spawn the fake on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());
        let router = Router::new()
            .fallback(dispatch)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve fake");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// A client config pointing every host at this fake.
    pub fn config(&self) -> FirebaseConfig {
        FirebaseConfig {
            project_id: PROJECT_ID.to_string(),
            web_api_key: SecretString::from("test-api-key"),
            storage_bucket: BUCKET.to_string(),
            identity_host: self.base_url.clone(),
            firestore_host: self.base_url.clone(),
            storage_host: self.base_url.clone(),
        }
    }

    /// Register an account the identity fake will accept.
    pub fn seed_account(&self, email: &str, password: &str, uid: &str) {
        self.state
            .accounts
            .lock()
            .expect("accounts lock")
            .insert(email.to_string(), (password.to_string(), uid.to_string()));
    }

    /// Insert a document (plain JSON fields) at `path`, e.g. `users/uid-1`.
    pub fn seed_document(&self, path: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.state
            .docs
            .lock()
            .expect("docs lock")
            .insert(path.to_string(), value::encode_fields(&fields));
    }

    /// Read a document back as plain JSON fields, if present.
    pub fn document(&self, path: &str) -> Option<Value> {
        let docs = self.state.docs.lock().expect("docs lock");
        docs.get(path).map(|wire| {
            let fields = wire.as_object().cloned().unwrap_or_default();
            Value::Object(value::decode_fields(&fields))
        })
    }

    /// Make uploads whose object path contains `pattern` fail with a 503.
    pub fn fail_uploads_matching(&self, pattern: &str) {
        *self
            .state
            .fail_uploads_matching
            .lock()
            .expect("fail lock") = Some(pattern.to_string());
    }

    /// Make every blob delete fail with a 503.
    pub fn fail_blob_deletes(&self) {
        *self.state.fail_blob_deletes.lock().expect("fail lock") = true;
    }

    /// All recorded state-changing calls, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().expect("calls lock").clone()
    }

    /// Number of recorded calls of one kind.
    pub fn count(&self, kind: &CallKind) -> usize {
        self.calls().iter().filter(|c| &c.kind == kind).count()
    }

    /// Position of the first call of `kind`, if any.
    pub fn first_index(&self, kind: &CallKind) -> Option<usize> {
        self.calls().iter().position(|c| &c.kind == kind)
    }

    /// Position of the last call of `kind`, if any.
    pub fn last_index(&self, kind: &CallKind) -> Option<usize> {
        self.calls().iter().rposition(|c| &c.kind == kind)
    }
}

fn record(state: &FakeState, kind: CallKind, path: &str) {
    state.calls.lock().expect("calls lock").push(Call {
        kind,
        path: path.to_string(),
    });
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn identity_error(message: &str) -> Response {
    json_response(
        StatusCode::BAD_REQUEST,
        json!({ "error": { "code": 400, "message": message } }),
    )
}

/// Route every request by path shape.
async fn dispatch(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let query = uri.query().unwrap_or("").to_string();

    if path.contains("/accounts:") {
        return identity(&state, &path, &body);
    }
    if path.ends_with("documents:commit") {
        return commit(&state, &body);
    }
    if path.ends_with("documents:runQuery") {
        return run_query(&state, &body);
    }
    if path.starts_with("/v0/b/") {
        return storage(&state, &method, &path, &query, &body);
    }
    if let Some(rel) = path.split("/documents/").nth(1) {
        return firestore_doc(&state, &method, rel, &body);
    }

    json_response(StatusCode::NOT_FOUND, json!({ "error": "no route" }))
}

// =============================================================================
// Identity Toolkit
// =============================================================================

fn identity(state: &FakeState, path: &str, body: &Bytes) -> Response {
    let payload: Value = serde_json::from_slice(body).unwrap_or_default();
    let email = payload["email"].as_str().unwrap_or_default().to_string();
    let password = payload["password"].as_str().unwrap_or_default().to_string();

    let method = path.rsplit("accounts:").next().unwrap_or_default();
    // The key query parameter is present on every call; the fake accepts any.
    match method.split('?').next().unwrap_or_default() {
        "signUp" => {
            let mut accounts = state.accounts.lock().expect("accounts lock");
            if accounts.contains_key(&email) {
                return identity_error("EMAIL_EXISTS");
            }
            let uid = format!("uid-{}", state.uid_counter.fetch_add(1, Ordering::SeqCst));
            accounts.insert(email.clone(), (password, uid.clone()));
            json_response(
                StatusCode::OK,
                json!({ "localId": uid, "email": email, "idToken": "test-token" }),
            )
        }
        "signInWithPassword" => {
            let accounts = state.accounts.lock().expect("accounts lock");
            match accounts.get(&email) {
                Some((stored, uid)) if stored == &password => json_response(
                    StatusCode::OK,
                    json!({ "localId": uid, "email": email, "idToken": "test-token" }),
                ),
                _ => identity_error("INVALID_LOGIN_CREDENTIALS"),
            }
        }
        "update" => json_response(StatusCode::OK, json!({})),
        "lookup" => json_response(StatusCode::OK, json!({ "users": [] })),
        _ => identity_error("OPERATION_NOT_ALLOWED"),
    }
}

// =============================================================================
// Firestore
// =============================================================================

fn commit(state: &FakeState, body: &Bytes) -> Response {
    let payload: Value = serde_json::from_slice(body).unwrap_or_default();
    let Some(write) = payload["writes"].get(0) else {
        return json_response(StatusCode::BAD_REQUEST, json!({ "error": "no writes" }));
    };

    let name = write["update"]["name"].as_str().unwrap_or_default();
    let rel = name.split("/documents/").nth(1).unwrap_or_default().to_string();
    let mut fields = write["update"]["fields"]
        .as_object()
        .cloned()
        .unwrap_or_default();

    // Apply REQUEST_TIME transforms the way the real store would.
    if let Some(transforms) = write["updateTransforms"].as_array() {
        for transform in transforms {
            if transform["setToServerValue"] == json!("REQUEST_TIME")
                && let Some(field) = transform["fieldPath"].as_str()
            {
                fields.insert(
                    field.to_string(),
                    json!({ "timestampValue": "2025-01-01T00:00:00Z" }),
                );
            }
        }
    }

    record(state, CallKind::Commit, &rel);
    state
        .docs
        .lock()
        .expect("docs lock")
        .insert(rel, Value::Object(fields));
    json_response(StatusCode::OK, json!({ "writeResults": [{}] }))
}

fn run_query(state: &FakeState, body: &Bytes) -> Response {
    let payload: Value = serde_json::from_slice(body).unwrap_or_default();
    let sq = &payload["structuredQuery"];
    let collection = sq["from"][0]["collectionId"].as_str().unwrap_or_default();
    let field = sq["where"]["fieldFilter"]["field"]["fieldPath"]
        .as_str()
        .unwrap_or_default();
    let wanted = value::decode(&sq["where"]["fieldFilter"]["value"]);

    let docs = state.docs.lock().expect("docs lock");
    let rows: Vec<Value> = docs
        .iter()
        .filter(|(path, _)| {
            let segments: Vec<&str> = path.split('/').collect();
            segments.len() == 2 && segments.first() == Some(&collection)
        })
        .filter(|(_, wire)| {
            let fields = wire.as_object().cloned().unwrap_or_default();
            value::decode_fields(&fields).get(field) == Some(&wanted)
        })
        .map(|(path, wire)| {
            json!({ "document": {
                "name": resource_name(path),
                "fields": wire,
            }})
        })
        .collect();

    let rows = if rows.is_empty() {
        vec![json!({ "readTime": "2025-01-01T00:00:00Z" })]
    } else {
        rows
    };
    json_response(StatusCode::OK, Value::Array(rows))
}

fn firestore_doc(state: &FakeState, method: &Method, rel: &str, body: &Bytes) -> Response {
    let rel = rel.to_string();
    let segments: Vec<&str> = rel.split('/').collect();
    let is_collection = segments.len() % 2 == 1;

    if *method == Method::GET {
        if is_collection {
            // Collection list: direct children only.
            let docs = state.docs.lock().expect("docs lock");
            let prefix = format!("{rel}/");
            let documents: Vec<Value> = docs
                .iter()
                .filter(|(path, _)| {
                    path.strip_prefix(&prefix)
                        .is_some_and(|tail| !tail.contains('/'))
                })
                .map(|(path, wire)| json!({ "name": resource_name(path), "fields": wire }))
                .collect();
            json_response(StatusCode::OK, json!({ "documents": documents }))
        } else {
            let docs = state.docs.lock().expect("docs lock");
            docs.get(&rel).map_or_else(
                || json_response(StatusCode::NOT_FOUND, json!({ "error": "missing" })),
                |wire| {
                    json_response(
                        StatusCode::OK,
                        json!({
                            "name": resource_name(&rel),
                            "fields": wire,
                            "createTime": "2025-01-01T00:00:00Z",
                        }),
                    )
                },
            )
        }
    } else if *method == Method::PATCH && !is_collection {
        let payload: Value = serde_json::from_slice(body).unwrap_or_default();
        let incoming = payload["fields"].as_object().cloned().unwrap_or_default();

        record(state, CallKind::Patch, &rel);
        let mut docs = state.docs.lock().expect("docs lock");
        let entry = docs.entry(rel).or_insert_with(|| Value::Object(Map::new()));
        if let Some(existing) = entry.as_object_mut() {
            for (k, v) in incoming {
                existing.insert(k, v);
            }
        }
        json_response(StatusCode::OK, json!({}))
    } else if *method == Method::DELETE && !is_collection {
        record(state, CallKind::DeleteDocument, &rel);
        state.docs.lock().expect("docs lock").remove(&rel);
        json_response(StatusCode::OK, json!({}))
    } else {
        json_response(StatusCode::METHOD_NOT_ALLOWED, json!({}))
    }
}

fn resource_name(rel: &str) -> String {
    format!("projects/{PROJECT_ID}/databases/(default)/documents/{rel}")
}

// =============================================================================
// Storage
// =============================================================================

fn storage(
    state: &FakeState,
    method: &Method,
    path: &str,
    query: &str,
    _body: &Bytes,
) -> Response {
    if *method == Method::POST {
        let name = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "name")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let fail = state
            .fail_uploads_matching
            .lock()
            .expect("fail lock")
            .clone();
        if fail.is_some_and(|pattern| name.contains(&pattern)) {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "upload rejected by test" }),
            );
        }

        record(state, CallKind::Upload, &name);
        json_response(
            StatusCode::OK,
            json!({
                "name": name,
                "bucket": BUCKET,
                "downloadTokens": "test-token",
            }),
        )
    } else if *method == Method::DELETE {
        let object = path
            .rsplit("/o/")
            .next()
            .map(|encoded| {
                urlencoding::decode(encoded)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| encoded.to_string())
            })
            .unwrap_or_default();

        if *state.fail_blob_deletes.lock().expect("fail lock") {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "delete rejected by test" }),
            );
        }

        record(state, CallKind::DeleteBlob, &object);
        json_response(StatusCode::OK, json!({}))
    } else {
        json_response(StatusCode::METHOD_NOT_ALLOWED, json!({}))
    }
}
