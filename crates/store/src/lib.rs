//! Turn and profile storage implementations for Rapport.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use rapport_config::StoreConfig;
use rapport_core::error::StorageError;
use rapport_core::store::{ChatStore, ProfileStore};
use std::sync::Arc;

/// The pair of stores the pipeline needs, usually backed by one object.
#[derive(Clone)]
pub struct Stores {
    pub chat: Arc<dyn ChatStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Stores {
    /// Use one backend for both turns and profiles.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: ChatStore + ProfileStore + 'static,
    {
        Self {
            chat: store.clone(),
            profiles: store,
        }
    }
}

/// Open the backend named in the configuration.
pub async fn open_from_config(config: &StoreConfig) -> Result<Stores, StorageError> {
    match config.backend.as_str() {
        "memory" => Ok(Stores::shared(Arc::new(InMemoryStore::new()))),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.sqlite_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Open(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            Ok(Stores::shared(Arc::new(SqliteStore::open(&path).await?)))
        }
        other => Err(StorageError::Open(format!("unsupported store backend '{other}'"))),
    }
}
