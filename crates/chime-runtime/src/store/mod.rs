//! Storage backend selection.

pub mod sqlite;

use std::sync::Arc;

use chime_core::{
    MemoryCache, MemoryStore, NoCache, PrefixStore, ScopeCache, ScopeStore, StoreResult,
};
use tracing::info;

pub use sqlite::SqliteStore;

use crate::config::{CacheMode, StorageBackend, StorageConfig};

/// The opened storage backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Sqlite(Arc<SqliteStore>),
    Memory(Arc<MemoryStore>),
}

impl Backend {
    /// Opens the backend described by `config`.
    pub async fn open(config: &StorageConfig) -> StoreResult<Self> {
        let backend = match config.backend {
            StorageBackend::Sqlite => Self::Sqlite(Arc::new(SqliteStore::connect(&config.path).await?)),
            StorageBackend::Memory => Self::Memory(Arc::new(MemoryStore::new())),
        };
        info!(backend = ?config.backend, "Storage opened");
        Ok(backend)
    }

    /// The scope side of the backend.
    pub fn scopes(&self) -> Arc<dyn ScopeStore> {
        match self {
            Self::Sqlite(store) => store.clone(),
            Self::Memory(store) => store.clone(),
        }
    }

    /// The prefix side of the backend.
    pub fn prefixes(&self) -> Arc<dyn PrefixStore> {
        match self {
            Self::Sqlite(store) => store.clone(),
            Self::Memory(store) => store.clone(),
        }
    }

    /// Releases the backend's connections.
    pub async fn close(&self) {
        if let Self::Sqlite(store) = self {
            store.close().await;
        }
    }
}

/// Builds the scope cache tier described by `mode`.
pub fn cache(mode: CacheMode) -> Arc<dyn ScopeCache> {
    match mode {
        CacheMode::Memory => Arc::new(MemoryCache::new()),
        CacheMode::None => Arc::new(NoCache),
    }
}
