//! Sentinel-aware client connection manager for Sockudo-KV
//!
//! Given a list of sentinel endpoints and a master name, walk the fleet
//! until a sentinel resolves the current write master, connect to it, and
//! keep the (possibly enriched) sentinel list around for reconnects.

pub mod client;
pub mod connection;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod sentinel;

pub use client::{DEFAULT_CONNECT_TIMEOUT, SentinelClient, default_sentinels};
pub use connection::Connection;
pub use error::{Error, Result};
pub use protocol::RespValue;
pub use sentinel::{ConnectionStatus, SentinelDiscovery};
