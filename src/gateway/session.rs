//! Session directory: which remote thread each chat channel talks to.

use relay_core::{error::RelayError, traits::SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Channel → thread lookups over a pluggable store, plus one lock per channel.
///
/// Holding a channel's lock makes the caller the only writer for that
/// channel, so two first-contact events cannot each create a thread.
pub struct SessionDirectory {
    store: Arc<dyn SessionStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionDirectory {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Backend name of the underlying store.
    pub fn backend(&self) -> &str {
        self.store.name()
    }

    /// Remote thread bound to `channel_id`, if any.
    pub async fn lookup(&self, channel_id: &str) -> Result<Option<String>, RelayError> {
        self.store.lookup(channel_id).await
    }

    /// Bind `channel_id` to `thread_id`.
    pub async fn bind(&self, channel_id: &str, thread_id: &str) -> Result<(), RelayError> {
        self.store.bind(channel_id, thread_id).await
    }

    /// Wait for exclusive access to `channel_id`.
    ///
    /// Locks nobody holds or waits on are dropped from the table here, so it
    /// only grows with the number of channels busy at the same time.
    pub async fn lock(&self, channel_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(channel_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_memory::InMemorySessionStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lookup_and_bind_delegate_to_store() {
        let dir = SessionDirectory::new(Arc::new(InMemorySessionStore::new()));
        assert_eq!(dir.backend(), "memory");
        assert!(dir.lookup("c1").await.unwrap().is_none());
        dir.bind("c1", "thread_1").await.unwrap();
        assert_eq!(dir.lookup("c1").await.unwrap().as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_per_channel() {
        let dir = Arc::new(SessionDirectory::new(Arc::new(InMemorySessionStore::new())));
        let guard = dir.lock("c1").await;

        let contender = {
            let dir = dir.clone();
            tokio::spawn(async move {
                let _g = dir.lock("c1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished(), "second lock on c1 must wait");

        // A different channel is not blocked.
        let _other = tokio::time::timeout(Duration::from_millis(200), dir.lock("c2"))
            .await
            .expect("c2 lock should be free");

        drop(guard);
        tokio::time::timeout(Duration::from_millis(200), contender)
            .await
            .expect("contender should finish once c1 is released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let dir = SessionDirectory::new(Arc::new(InMemorySessionStore::new()));
        for i in 0..50 {
            drop(dir.lock(&format!("c{i}")).await);
        }
        let held = dir.lock("busy").await;
        assert_eq!(dir.locks.lock().await.len(), 1);

        drop(dir.lock("other").await);
        let locks = dir.locks.lock().await;
        assert!(locks.contains_key("busy"), "held lock must survive pruning");
        drop(locks);
        drop(held);
    }
}
