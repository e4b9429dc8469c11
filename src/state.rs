//! Application state for Folio.
//!
//! Contains the shared state that is passed to all handlers. The identity,
//! document and blob gateways are held as trait objects so tests and
//! alternative backends can be swapped in.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Config};
use crate::db::{self, DbPool};
use crate::services::{
    AccountService, BlobStorage, DocumentStore, IdentityProvider, LocalBlobStorage,
    RegistrationService, SectionForms, SqliteDocumentStore,
};
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    pub config: Arc<Config>,
    /// Accounts and sessions.
    pub identity: Arc<dyn IdentityProvider>,
    /// Per-user documents with change notifications.
    pub documents: Arc<dyn DocumentStore>,
    /// Uploaded images.
    pub blobs: Arc<dyn BlobStorage>,
    /// Upload dashboard forms.
    pub forms: SectionForms,
    /// Sign-up form.
    pub registration: RegistrationService,
}

impl AppState {
    /// Create the application state from the global configuration.
    pub async fn new() -> Result<Self> {
        Self::from_config(config::config().clone()).await
    }

    /// Create the application state, opening the database and applying the
    /// schema.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = db::init_pool(&config.database.path).await?;
        db::initialize_schema(&db).await?;

        let identity: Arc<dyn IdentityProvider> = Arc::new(AccountService::new(
            db.clone(),
            config.auth.clone(),
            config.session.clone(),
        ));
        let documents: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(db.clone()));
        let blobs: Arc<dyn BlobStorage> = Arc::new(LocalBlobStorage::new(
            db.clone(),
            PathBuf::from(&config.storage.blobs_path),
            &config.storage.blobs_public_url,
            config.storage.max_upload_size,
        ));

        let forms = SectionForms::new(
            documents.clone(),
            blobs.clone(),
            config.forms.notice_ttl_ms,
        );
        let registration =
            RegistrationService::new(identity.clone(), documents.clone(), blobs.clone());

        Ok(Self {
            db,
            config: Arc::new(config),
            identity,
            documents,
            blobs,
            forms,
            registration,
        })
    }
}
