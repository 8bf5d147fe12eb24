use async_trait::async_trait;
use cinder::ports::KeyValueStore;
use moka::Expiry;
use moka::future::Cache;
use shared::{Error, Result, TtlSecs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with. An overwrite
/// restarts the clock, matching `SET key value EX secs`.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-based in-process store with per-key expiration.
/// Stands in for a Redis server in local runs and tests.
pub struct MokaStore {
    cache: Cache<String, Entry>,
    open: AtomicBool,
}

impl MokaStore {
    /// Create a store, optionally bounded to `max_entries`
    pub fn new(name: String, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(&name).expire_after(PerEntryTtl);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
            open: AtomicBool::new(true),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::Closed)
        }
    }
}

#[async_trait]
impl KeyValueStore for MokaStore {
    fn is_alive(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        // Either doesn't exist or TTL expired
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        self.ensure_open()?;
        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.as_duration(),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            self.cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entry_count", &self.cache.entry_count())
            .field("open", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder::CacheClient;
    use std::sync::Arc;
    use tokio::time::sleep;

    fn store() -> MokaStore {
        MokaStore::new("test".to_string(), None)
    }

    #[tokio::test]
    async fn test_moka_store_set_and_get() {
        let store = store();

        store.set_ex("hello", "world", TtlSecs(60)).await.unwrap();

        assert_eq!(store.get("hello").await.unwrap().as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_moka_store_del() {
        let store = store();

        store.set_ex("test_key", "test_value", TtlSecs(60)).await.unwrap();

        assert!(store.del("test_key").await.unwrap());
        assert_eq!(store.get("test_key").await.unwrap(), None);
        // Already gone
        assert!(!store.del("test_key").await.unwrap());
    }

    #[tokio::test]
    async fn test_moka_store_overwrite() {
        let store = store();

        store.set_ex("key", "value1", TtlSecs(60)).await.unwrap();
        store.set_ex("key", "value2", TtlSecs(60)).await.unwrap();

        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value2"));
    }

    #[tokio::test]
    async fn test_moka_store_entry_expires() {
        let store = store();

        store.set_ex("short", "lived", TtlSecs(1)).await.unwrap();
        store.set_ex("long", "lived", TtlSecs(60)).await.unwrap();
        assert!(store.get("short").await.unwrap().is_some());

        sleep(Duration::from_millis(1200)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("lived"));
    }

    #[tokio::test]
    async fn test_moka_store_overwrite_resets_ttl() {
        let store = store();

        store.set_ex("key", "first", TtlSecs(1)).await.unwrap();
        store.set_ex("key", "second", TtlSecs(60)).await.unwrap();

        sleep(Duration::from_millis(1200)).await;

        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_moka_store_close() {
        let store = store();
        store.set_ex("key", "value", TtlSecs(60)).await.unwrap();

        store.close().await;

        assert!(!store.is_alive());
        assert!(matches!(store.get("key").await, Err(Error::Closed)));
        assert!(matches!(store.del("key").await, Err(Error::Closed)));
        store.close().await;
    }

    #[tokio::test]
    async fn test_client_over_moka_store() {
        let client = CacheClient::new(Arc::new(store()));
        assert!(client.is_alive());

        client.set("visits", 3, TtlSecs(60)).await.unwrap();
        assert_eq!(client.get("visits").await.unwrap().as_deref(), Some("3"));

        client.del("visits").await.unwrap();
        client.del("visits").await.unwrap();
        assert_eq!(client.get("visits").await.unwrap(), None);

        client.close().await;
        assert!(!client.is_alive());
    }
}
