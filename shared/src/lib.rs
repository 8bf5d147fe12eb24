// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The connection to the store failed or was lost mid-request
    #[error("transport: {0}")]
    Transport(String),
    /// The store answered but refused the command
    #[error("command rejected: {0}")]
    Rejected(String),
    #[error("invalid expiration: {0}s")]
    InvalidTtl(u64),
    #[error("client closed")]
    Closed,
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Errors raised by the store side of an exchange, as opposed to local
    /// validation or lifecycle errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expiration in whole seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSecs(pub u64);

impl TtlSecs {
    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0)
    }
}

impl From<std::time::Duration> for TtlSecs {
    fn from(duration: std::time::Duration) -> Self {
        TtlSecs(duration.as_secs())
    }
}

pub mod config;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_classification() {
        assert!(Error::Transport("broken pipe".into()).is_transport());
        assert!(Error::Rejected("WRONGTYPE".into()).is_transport());
        assert!(!Error::InvalidTtl(0).is_transport());
        assert!(!Error::Closed.is_transport());
        assert!(!Error::Config("bad".into()).is_transport());
    }

    #[test]
    fn test_ttl_from_duration_truncates() {
        assert_eq!(TtlSecs::from(Duration::from_millis(2500)), TtlSecs(2));
        assert_eq!(TtlSecs(3).as_duration(), Duration::from_secs(3));
    }
}
