use async_trait::async_trait;
use cinder::ports::KeyValueStore;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{
    AsyncCommands, Client, ConnectionInfo, ErrorKind, IntoConnectionInfo, RedisError, RedisResult,
};
use shared::config::RedisSettings;
use shared::{Error, Result, TtlSecs};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Redis-backed store holding a single multiplexed connection.
///
/// The connection manager reconnects on its own after the link drops.
/// Liveness is learned from requests: the store keeps reporting alive after
/// the server goes away until a request fails, and reports alive again once
/// a later request succeeds.
pub struct RedisStore {
    connection: RwLock<Option<ConnectionManager>>,
    alive: AtomicBool,
}

impl RedisStore {
    /// Open a connection to the Redis server described by `settings`.
    ///
    /// Gives up after `connect_retries` further attempts, each bounded by
    /// `connect_timeout`.
    pub async fn connect(settings: &RedisSettings) -> Result<Self> {
        let client = connection_info(settings)
            .and_then(Client::open)
            .map_err(map_redis_error)?;
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(settings.connect_retries)
            .set_connection_timeout(settings.connect_timeout);
        let manager = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(map_redis_error)?;

        info!("Connected to redis at {}", settings.address());

        Ok(Self::from_manager(manager))
    }

    /// Wrap an already established connection manager
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self {
            connection: RwLock::new(Some(manager)),
            alive: AtomicBool::new(true),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.connection.read().await.clone().ok_or(Error::Closed)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let result: RedisResult<Option<String>> = conn.get(key).await;
        record_outcome(&self.alive, result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        let mut conn = self.connection().await?;
        let result: RedisResult<()> = conn.set_ex(key, value, ttl.0).await;
        record_outcome(&self.alive, result)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let result: RedisResult<i64> = conn.del(key).await;
        record_outcome(&self.alive, result).map(|removed| removed > 0)
    }

    async fn close(&self) {
        let previous = self.connection.write().await.take();
        self.alive.store(false, Ordering::Release);
        if previous.is_some() {
            info!("Redis connection closed");
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// The password travels as a field, never through a URL
fn connection_info(settings: &RedisSettings) -> RedisResult<ConnectionInfo> {
    let mut info = (settings.host.as_str(), settings.port).into_connection_info()?;
    info.redis.db = settings.db;
    info.redis.password = settings.password.clone();
    Ok(info)
}

/// Success marks the link alive, a transport failure marks it down, and a
/// rejected command leaves it as it was.
fn record_outcome<T>(alive: &AtomicBool, result: RedisResult<T>) -> Result<T> {
    match result {
        Ok(value) => {
            alive.store(true, Ordering::Release);
            Ok(value)
        }
        Err(err) => {
            let err = map_redis_error(err);
            if matches!(err, Error::Transport(_)) {
                alive.store(false, Ordering::Release);
            }
            Err(err)
        }
    }
}

/// Link-level failures become [`Error::Transport`]; anything the server
/// answered with becomes [`Error::Rejected`]. Logging is left to the caller.
fn map_redis_error(err: RedisError) -> Error {
    if err.kind() == ErrorKind::InvalidClientConfig {
        return Error::Config(err.to_string());
    }
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        return Error::Transport(err.to_string());
    }
    Error::Rejected(err.to_string())
}
