//! Sentinel-aware client
//!
//! Public entry point: discover the current master through a sentinel
//! fleet, hold the data connection to it, and expose the enriched sentinel
//! list for future reconnects. The client does not reconnect on its own
//! when the master connection later drops; it only notifies the disconnect
//! hook and surfaces the error.

use bytes::Bytes;
use parking_lot::Mutex;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::RespValue;
use crate::sentinel::{ConnectionStatus, SentinelDiscovery};

/// Default per-attempt connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: f64 = 0.05;

/// Default candidate list for local development setups
pub fn default_sentinels() -> Vec<String> {
    vec!["localhost:6379".to_string()]
}

type DisconnectCallback = Box<dyn Fn() + Send + Sync>;

pub struct SentinelClient {
    discovery: Option<SentinelDiscovery>,
    connection: Option<Connection>,
    disconnect_callback: Mutex<Option<DisconnectCallback>>,
}

impl SentinelClient {
    pub fn new() -> Self {
        Self {
            discovery: None,
            connection: None,
            disconnect_callback: Mutex::new(None),
        }
    }

    /// Register a hook invoked when the active connection is later found
    /// dropped. Independent of the discovery state machine.
    pub fn set_disconnect_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.disconnect_callback.lock() = Some(Box::new(callback));
    }

    /// Discover the master via `sentinels` and connect to it.
    ///
    /// Validation failures (empty candidate list, empty master name) return
    /// synchronously before any network activity. Every per-candidate fault
    /// is absorbed into the walk; the terminal outcome is the returned
    /// status, also observable via [`status`](Self::status) after the
    /// `completion` hook has fired. The hook fires exactly once per call.
    ///
    /// A successful discovery replaces the active data connection; the
    /// previous stream is dropped.
    pub async fn connect<F>(
        &mut self,
        sentinels: Vec<String>,
        master_name: &str,
        completion: F,
        timeout: f64,
    ) -> Result<ConnectionStatus>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut discovery =
            SentinelDiscovery::new(sentinels, master_name, Some(Box::new(completion)), timeout)?;

        let connection = discovery.run().await;
        let status = discovery.status();

        if let Some(connection) = connection {
            match connection.peer_addr() {
                Ok(addr) => log::info!("Connected to master '{}' at {}", master_name, addr),
                Err(_) => log::info!("Connected to master '{}'", master_name),
            }
            self.connection = Some(connection);
        }
        self.discovery = Some(discovery);

        Ok(status)
    }

    /// Outcome of the most recent discovery session
    pub fn status(&self) -> ConnectionStatus {
        self.discovery
            .as_ref()
            .map(SentinelDiscovery::status)
            .unwrap_or_default()
    }

    /// Candidate list of the most recent session, including learned peers
    pub fn sentinels(&self) -> &[String] {
        self.discovery
            .as_ref()
            .map(SentinelDiscovery::sentinels)
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Send one command on the active connection and return the typed reply.
    ///
    /// A closed or broken connection drops the stream, fires the disconnect
    /// hook and surfaces the error; the caller decides whether to rediscover.
    pub async fn send_command(&mut self, parts: &[&str]) -> Result<RespValue> {
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;

        match connection.round_trip(parts).await {
            Ok(reply) => Ok(reply),
            Err(e @ (Error::ConnectionClosed | Error::Io(_))) => {
                self.handle_disconnect();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn handle_disconnect(&mut self) {
        log::warn!("Master connection dropped");
        self.connection = None;
        if let Some(callback) = &*self.disconnect_callback.lock() {
            callback();
        }
    }

    pub async fn ping(&mut self) -> Result<()> {
        let reply = self.send_command(&["PING"]).await?;
        expect_ok(reply)
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let reply = self.send_command(&["SET", key, value]).await?;
        expect_ok(reply)
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Bytes>> {
        let reply = self.send_command(&["GET", key]).await?;
        match reply {
            RespValue::Error(e) => Err(server_error(&e)),
            value if value.is_null() => Ok(None),
            value => value
                .as_bytes()
                .cloned()
                .map(Some)
                .ok_or_else(|| Error::Protocol("unexpected GET reply type".into())),
        }
    }

    pub async fn publish(&mut self, channel: &str, message: &str) -> Result<i64> {
        let reply = self.send_command(&["PUBLISH", channel, message]).await?;
        match reply {
            RespValue::Error(e) => Err(server_error(&e)),
            value => value
                .as_int()
                .ok_or_else(|| Error::Protocol("unexpected PUBLISH reply type".into())),
        }
    }
}

impl Default for SentinelClient {
    fn default() -> Self {
        Self::new()
    }
}

fn server_error(message: &Bytes) -> Error {
    Error::Server(String::from_utf8_lossy(message).into_owned())
}

fn expect_ok(reply: RespValue) -> Result<()> {
    match reply {
        RespValue::SimpleString(_) => Ok(()),
        RespValue::Error(e) => Err(server_error(&e)),
        _ => Err(Error::Protocol("unexpected status reply type".into())),
    }
}
