mod moka_store;
mod redis_store;

pub use moka_store::MokaStore;
pub use redis_store::RedisStore;

use cinder::ports::KeyValueStore;
use shared::Result;
use shared::config::{Backend, Config};
use std::sync::Arc;

/// Connects the store selected by `config.backend`
pub async fn connect_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        Backend::Redis => Ok(Arc::new(RedisStore::connect(&config.redis).await?)),
        Backend::Memory => Ok(Arc::new(MokaStore::new("cinder".to_string(), None))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_is_alive() {
        let config = Config {
            backend: Backend::Memory,
            ..Config::default()
        };

        let store = connect_store(&config).await.unwrap();
        assert!(store.is_alive());
    }
}
