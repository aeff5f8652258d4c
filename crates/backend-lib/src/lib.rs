// ============================
// students-backend-lib/src/lib.rs
// ============================
//! Core of the students service: cache-aside student storage, password
//! credentials and token-based sessions, plus a thin HTTP surface.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod store;
pub mod usecase;
pub mod validation;

use std::sync::Arc;
use tracing::info;

use crate::auth::{
    AuthService, CredentialManager, FlatFileRefreshTokenStore, MemoryRefreshTokenStore,
    RefreshTokenStore, SessionAuthority, SessionPolicy, TokenSigner,
};
use crate::config::{Settings, StorageBackend};
use crate::storage::{Cache, FlatFileRecordStore, MemoryCache, MemoryRecordStore, RecordStore};
use crate::store::StudentStore;
use crate::usecase::StudentService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Student and session use cases
    pub students: StudentService,
    /// Session authority, kept concrete for the cleanup task
    pub sessions: Arc<SessionAuthority>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the service over explicit storage backends
    pub fn new(
        settings: Settings,
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn Cache>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> anyhow::Result<Self> {
        let credentials = CredentialManager::new(&settings.password)?;
        let signer = TokenSigner::new(
            settings.auth.signing_secret.as_bytes(),
            settings.auth.issuer.clone(),
        )?;

        let store = StudentStore::new(records, cache);
        let sessions = Arc::new(SessionAuthority::new(
            Arc::new(store.clone()),
            credentials.clone(),
            signer,
            refresh_tokens,
            SessionPolicy::from(&settings.auth),
        ));
        let auth: Arc<dyn AuthService> = sessions.clone();

        Ok(Self {
            students: StudentService::new(store, credentials, auth),
            sessions,
            settings: Arc::new(settings),
        })
    }

    /// Build the state from validated settings, choosing the configured backend
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

        let (records, refresh_tokens): (Arc<dyn RecordStore>, Arc<dyn RefreshTokenStore>) =
            match settings.storage.backend {
                StorageBackend::Memory => (
                    Arc::new(MemoryRecordStore::new()),
                    Arc::new(MemoryRefreshTokenStore::new()),
                ),
                StorageBackend::FlatFile => {
                    let root = &settings.storage.path;
                    (
                        Arc::new(FlatFileRecordStore::new(root)?),
                        Arc::new(FlatFileRefreshTokenStore::new(root.join("refresh_tokens"))?),
                    )
                },
            };
        info!(backend = ?settings.storage.backend, "storage initialized");

        Self::new(settings, records, cache, refresh_tokens)
    }
}
