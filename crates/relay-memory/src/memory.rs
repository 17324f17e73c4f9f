//! Volatile session store. Bindings are lost when the process exits.

use async_trait::async_trait;
use relay_core::{error::RelayError, traits::SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local channel → thread map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, channel_id: &str) -> Result<Option<String>, RelayError> {
        Ok(self.sessions.read().await.get(channel_id).cloned())
    }

    async fn bind(&self, channel_id: &str, thread_id: &str) -> Result<(), RelayError> {
        self.sessions
            .write()
            .await
            .insert(channel_id.to_string(), thread_id.to_string());
        Ok(())
    }
}
