use crate::domain::CacheValue;
use crate::events::{Operation, TransportErrorEvent, now_timestamp};
use crate::ports::KeyValueStore;
use shared::{Error, Result, TtlSecs};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Async facade over a key-value store connection.
///
/// Every operation is a single request forwarded to the store. Transport
/// failures are logged once and returned to the caller; nothing is retried.
/// Clones share the same store connection.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn KeyValueStore>,
    error_broadcaster: Option<broadcast::Sender<TransportErrorEvent>>,
}

impl CacheClient {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            error_broadcaster: None,
        }
    }

    /// Like [`CacheClient::new`], additionally publishing a
    /// [`TransportErrorEvent`] for each transport failure.
    pub fn with_error_broadcaster(
        store: Arc<dyn KeyValueStore>,
        broadcaster: broadcast::Sender<TransportErrorEvent>,
    ) -> Self {
        Self {
            store,
            error_broadcaster: Some(broadcaster),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.store.is_alive()
    }

    /// Returns `None` if the key does not exist or has expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store
            .get(key)
            .await
            .map_err(|e| self.report(Operation::Get, key, e))
    }

    /// Writes `value` under `key`; the store drops the key once `ttl` elapses.
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>, ttl: TtlSecs) -> Result<()> {
        if ttl.0 == 0 {
            return Err(Error::InvalidTtl(ttl.0));
        }
        let value = value.into().to_string();
        self.store
            .set_ex(key, &value, ttl)
            .await
            .map_err(|e| self.report(Operation::Set, key, e))
    }

    /// Deleting a key that does not exist is not an error.
    pub async fn del(&self, key: &str) -> Result<()> {
        let removed = self
            .store
            .del(key)
            .await
            .map_err(|e| self.report(Operation::Del, key, e))?;
        tracing::trace!("del '{}' removed={}", key, removed);
        Ok(())
    }

    /// Releases the store connection. Later operations fail with [`Error::Closed`].
    pub async fn close(&self) {
        self.store.close().await;
    }

    fn report(&self, operation: Operation, key: &str, err: Error) -> Error {
        if !err.is_transport() {
            return err;
        }

        tracing::error!(
            operation = operation.as_str(),
            key,
            error = %err,
            "cache operation failed"
        );

        if let Some(ref broadcaster) = self.error_broadcaster {
            let event = TransportErrorEvent {
                operation,
                key: key.to_string(),
                message: err.to_string(),
                timestamp: now_timestamp(),
            };
            match broadcaster.send(event) {
                Ok(subscriber_count) => {
                    tracing::debug!(
                        "Broadcasted transport error for '{}' to {} subscriber(s)",
                        key,
                        subscriber_count
                    );
                }
                Err(_) => {
                    tracing::warn!("No subscribers for transport error on '{}'", key);
                }
            }
        }

        err
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("alive", &self.store.is_alive())
            .field("error_broadcaster", &self.error_broadcaster.is_some())
            .finish()
    }
}
