//! # relay-memory
//!
//! Session storage for Relay: where each chat channel's remote thread id lives.

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;

use relay_core::{
    config::{MemoryBackend, MemoryConfig},
    error::RelayError,
    traits::SessionStore,
};
use std::sync::Arc;

/// Build the session store selected by `config.backend`.
pub async fn build_store(config: &MemoryConfig) -> Result<Arc<dyn SessionStore>, RelayError> {
    match config.backend {
        MemoryBackend::Memory => Ok(Arc::new(InMemorySessionStore::new())),
        MemoryBackend::Sqlite => Ok(Arc::new(SqliteSessionStore::new(&config.db_path).await?)),
    }
}
