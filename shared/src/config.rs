use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Redis,
    Memory, // in-process, nothing leaves the process
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => Err(Error::Config(format!("unknown backend '{other}'"))),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    /// Attempts made by the connection manager after the first connect fails
    pub connect_retries: usize,
    pub connect_timeout: Duration,
}

impl RedisSettings {
    /// `host:port/db`, safe to log
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: Config::DEFAULT_REDIS_HOST.to_string(),
            port: Config::DEFAULT_REDIS_PORT,
            db: 0,
            password: None,
            connect_retries: Config::DEFAULT_CONNECT_RETRIES,
            connect_timeout: Duration::from_millis(Config::DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_retries", &self.connect_retries)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub redis: RedisSettings,
    pub probe_round_trip: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Redis,
            redis: RedisSettings::default(),
            probe_round_trip: false,
        }
    }
}

impl Config {
    const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
    const DEFAULT_REDIS_PORT: u16 = 6379;
    const DEFAULT_CONNECT_RETRIES: usize = 1;
    const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Missing or malformed
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("CINDER_BACKEND") {
            Some(raw) => raw.parse::<Backend>().unwrap_or_else(|e| {
                warn!("{e}, falling back to redis");
                Backend::Redis
            }),
            None => Backend::Redis,
        };

        let redis = RedisSettings {
            host: lookup("CINDER_REDIS_HOST")
                .unwrap_or_else(|| Self::DEFAULT_REDIS_HOST.to_string()),
            port: parse_or("CINDER_REDIS_PORT", &lookup, Self::DEFAULT_REDIS_PORT),
            db: parse_or("CINDER_REDIS_DB", &lookup, 0),
            password: lookup("CINDER_REDIS_PASSWORD").filter(|p| !p.is_empty()),
            connect_retries: parse_or(
                "CINDER_REDIS_CONNECT_RETRIES",
                &lookup,
                Self::DEFAULT_CONNECT_RETRIES,
            ),
            connect_timeout: Duration::from_millis(parse_or(
                "CINDER_REDIS_CONNECT_TIMEOUT_MS",
                &lookup,
                Self::DEFAULT_CONNECT_TIMEOUT_MS,
            )),
        };

        Self {
            backend,
            redis,
            probe_round_trip: parse_or("CINDER_PROBE_ROUND_TRIP", &lookup, false),
        }
    }
}

fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{name}={raw:?} is not valid, using default {default:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.redis.address(), "127.0.0.1:6379/0");
        assert_eq!(config.redis.connect_retries, 1);
        assert_eq!(config.redis.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = Config::from_lookup(lookup_from(&[
            ("CINDER_BACKEND", "Memory"),
            ("CINDER_REDIS_HOST", "cache.internal"),
            ("CINDER_REDIS_PORT", "6380"),
            ("CINDER_REDIS_DB", "2"),
            ("CINDER_REDIS_PASSWORD", "hunter2"),
            ("CINDER_REDIS_CONNECT_RETRIES", "0"),
            ("CINDER_REDIS_CONNECT_TIMEOUT_MS", "250"),
            ("CINDER_PROBE_ROUND_TRIP", "true"),
        ]));

        assert_eq!(config.backend, Backend::Memory);
        assert!(config.probe_round_trip);
        assert_eq!(config.redis.address(), "cache.internal:6380/2");
        assert_eq!(config.redis.password.as_deref(), Some("hunter2"));
        assert_eq!(config.redis.connect_retries, 0);
        assert_eq!(config.redis.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_password_never_rendered() {
        let config = Config::from_lookup(lookup_from(&[("CINDER_REDIS_PASSWORD", "p@ss/w:rd")]));

        assert!(!config.redis.address().contains("p@ss"));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("p@ss"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("CINDER_BACKEND", "memcached"),
            ("CINDER_REDIS_PORT", "not-a-port"),
            ("CINDER_REDIS_PASSWORD", ""),
        ]));

        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.password, None);
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err = "etcd".parse::<Backend>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
