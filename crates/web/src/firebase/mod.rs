//! Firebase REST API clients.
//!
//! # Architecture
//!
//! - Firebase is source of truth - NO local sync, direct API calls
//! - One typed client per service, each with its own error enum:
//!   - [`IdentityClient`] - Identity Toolkit (`accounts:*` endpoints)
//!   - [`FirestoreClient`] - Cloud Firestore (`documents` endpoints)
//!   - [`StorageClient`] - Cloud Storage for Firebase (`v0` endpoints)
//! - The Firestore wire format types every field
//!   (`stringValue`/`integerValue`/...); the [`firestore::value`] codec
//!   translates between that encoding and plain `serde_json` values so the
//!   rest of the crate never sees it.
//!
//! Endpoint hosts come from [`crate::config::FirebaseConfig`] and default to
//! the production Google endpoints; overriding them points the clients at
//! the emulator suite or the test fake.
//!
//! # Example
//!
//! ```rust,ignore
//! use chalkboard_web::firebase::{FirestoreClient, StorageClient};
//!
//! let firestore = FirestoreClient::new(&config.firebase);
//! let course = firestore.get_document("courses", "c-123").await?;
//!
//! let storage = StorageClient::new(&config.firebase);
//! let object = storage
//!     .upload(&StoragePath::thumbnail(&uid, "cover.png"), bytes, "image/png")
//!     .await?;
//! ```

pub mod firestore;
pub mod identity;
pub mod storage;

pub use firestore::{Document, FirestoreClient, FirestoreError};
pub use identity::{AuthUser, IdentityClient, IdentityError};
pub use storage::{StorageClient, StorageError, StoragePath, UploadedObject};
