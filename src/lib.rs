pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{CollectionSource, CredentialStore, Directory, MemoryStore, PgStore, RecordStore};
use crate::services::admin::AdminService;
use crate::services::identity::IdentityService;
use crate::services::session::SessionResolver;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub identity: Arc<IdentityService>,
    pub sessions: SessionResolver,
    pub admin: AdminService,
    pub directory: Arc<dyn Directory>,
    pub collections: Arc<dyn CollectionSource>,
    pub records: Arc<dyn RecordStore>,
}

impl AppState {
    /// Wire every service over one store implementing all storage ports.
    pub fn new<S>(config: AppConfig, store: Arc<S>) -> Self
    where
        S: CollectionSource + Directory + CredentialStore + RecordStore + 'static,
    {
        let identity = Arc::new(IdentityService::new(
            store.clone(),
            &config.jwt_secret,
            config.session_expiry_secs,
        ));
        let sessions = SessionResolver::new(identity.clone(), store.clone(), store.clone());
        let admin = AdminService::new(identity.clone(), store.clone(), store.clone());
        Self {
            config,
            identity,
            sessions,
            admin,
            directory: store.clone(),
            collections: store.clone(),
            records: store,
        }
    }

    pub fn with_postgres(config: AppConfig, pool: PgPool) -> Self {
        Self::new(config, Arc::new(PgStore::new(pool)))
    }

    /// State over a fresh in-memory store, returned alongside for seeding.
    pub fn in_memory(config: AppConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Self::new(config, store.clone()), store)
    }
}
