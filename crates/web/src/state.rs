//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::firebase::{FirestoreClient, IdentityClient, StorageClient};
use crate::services::CatalogService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the Firebase clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    identity: IdentityClient,
    firestore: FirestoreClient,
    storage: StorageClient,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let identity = IdentityClient::new(&config.firebase);
        let firestore = FirestoreClient::new(&config.firebase);
        let storage = StorageClient::new(&config.firebase);
        let catalog = CatalogService::new(firestore.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                firestore,
                storage,
                catalog,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Identity Toolkit client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the Firestore client.
    #[must_use]
    pub fn firestore(&self) -> &FirestoreClient {
        &self.inner.firestore
    }

    /// Get a reference to the Storage client.
    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}
