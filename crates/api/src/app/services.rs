use std::sync::Arc;

use libcat_infra::{db, AppConfig, InMemoryLibraryStore, LibraryStore, PostgresLibraryStore, StoreError};

/// Shared per-process services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn LibraryStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Services backed by a fresh in-memory store (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLibraryStore::new()))
    }

    pub fn store(&self) -> &dyn LibraryStore {
        self.store.as_ref()
    }
}

/// Build services from configuration.
///
/// The persistent path connects the pool and creates missing tables before
/// the server accepts requests.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    if !config.use_persistent_stores {
        tracing::warn!("USE_PERSISTENT_STORES=false; catalog data lives in memory only");
        return Ok(AppServices::in_memory());
    }

    let pool = db::connect(&config.database).await?;
    db::ensure_schema(&pool).await?;
    Ok(AppServices::new(Arc::new(PostgresLibraryStore::new(pool))))
}
