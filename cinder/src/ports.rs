#![deny(clippy::all)]

use async_trait::async_trait;
use shared::{Result, TtlSecs};

// Ports are the pluggable extension points for the underlying store client

/// Port for a key-value store with per-key expiration (e.g., Redis)
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Whether the connection to the store is currently established
    fn is_alive(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()>;

    /// Returns `true` if a key was removed
    async fn del(&self, key: &str) -> Result<bool>;

    /// Releases the connection. Calling it twice is a no-op.
    async fn close(&self);
}
