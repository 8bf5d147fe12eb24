//! Async cache client adapter.
//!
//! [`client::CacheClient`] forwards get / set-with-expiration / delete to a
//! [`ports::KeyValueStore`] and reports transport failures through `tracing`
//! and an optional event channel.

pub mod client;
pub mod domain;
pub mod events;
pub mod ports;

pub use client::CacheClient;
pub use domain::CacheValue;
pub use ports::KeyValueStore;
