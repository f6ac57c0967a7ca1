//! In-process backing store, for tests and single-node deployments.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BackingError, BackingStore};

/// HashMap-backed store honouring per-key TTLs. No deadline means the TTL
/// reaches past what `Instant` can represent.
#[derive(Debug, Default)]
pub struct MemoryBackingStore {
    data: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

fn is_live(expires_at: Option<Instant>) -> bool {
    expires_at.map_or(true, |deadline| Instant::now() < deadline)
}

impl MemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired or not.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Whether a live value is stored under the exact (namespaced) key.
    pub fn contains(&self, key: &str) -> bool {
        self.data
            .lock()
            .get(key)
            .is_some_and(|(_, expires_at)| is_live(*expires_at))
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackingError> {
        let mut data = self.data.lock();
        match data.get(key) {
            Some((value, expires_at)) if is_live(*expires_at) => Ok(Some(value.clone())),
            Some(_) => {
                data.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), BackingError> {
        let expires_at = Instant::now().checked_add(Duration::from_secs(ttl_secs));
        self.data.lock().insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackingError> {
        self.data.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryBackingStore::new();

        store.set("ns:k", b"\"v\"".to_vec(), 60).await.unwrap();
        assert_eq!(store.get("ns:k").await.unwrap(), Some(b"\"v\"".to_vec()));
        assert!(store.contains("ns:k"));

        store.delete("ns:k").await.unwrap();
        assert_eq!(store.get("ns:k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let store = MemoryBackingStore::new();
        assert!(store.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let store = MemoryBackingStore::new();
        store.set("k", b"1".to_vec(), u64::MAX).await.unwrap();

        assert!(store.contains("k"));
        assert_eq!(store.get("k").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = MemoryBackingStore::new();
        store.set("k", b"1".to_vec(), 0).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.len(), 0);
    }
}
