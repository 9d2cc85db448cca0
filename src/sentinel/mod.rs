//! Sentinel-based master discovery
//!
//! Client-side counterpart to a Redis Sentinel deployment: ask the fleet
//! which node currently accepts writes, connect to it, and remember every
//! sentinel the fleet mentions along the way for future reconnects.
//!
//! The design trusts whichever sentinel answers first - there is no quorum
//! logic on the client side.

pub mod discovery;
pub mod replies;

pub use discovery::{Completion, ConnectionStatus, SentinelDiscovery};
