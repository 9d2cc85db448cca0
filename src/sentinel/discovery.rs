//! Sentinel Master Discovery
//!
//! Walks an ordered, self-enriching list of sentinel endpoints until one of
//! them yields a connectable master. Three round trips per candidate, all
//! strictly sequential:
//!
//! 1. connect to the sentinel (deadline-guarded)
//! 2. `SENTINEL SENTINELS <name>` - learn peers, append unknown ones
//! 3. `SENTINEL GET-MASTER-ADDR-BY-NAME <name>` - resolve the master
//!
//! then a final guarded connect to the resolved master. Any failure at any
//! step advances to the next candidate; exhausting the list is the only
//! failure the caller ever sees.

use crate::connection::Connection;
use crate::connector::{connect_with_timeout, split_endpoint};
use crate::error::{Error, Result};
use crate::sentinel::replies;

/// Terminal outcome of a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No session has reached a terminal state yet
    #[default]
    Unconnected,
    /// A data connection to the master is established
    Connected,
    /// Every candidate was tried and none yielded a master connection
    FailedAfterAllSentinels,
}

/// One-shot completion hook, fired exactly once per session
pub type Completion = Box<dyn FnOnce() + Send>;

/// Discovery state machine steps
///
/// Kept explicit so each transition is one arm of [`SentinelDiscovery::transition`].
enum DiscoveryStep {
    SelectCandidate,
    ConnectToSentinel { endpoint: String },
    QuerySentinelList { link: Connection },
    QueryMasterAddress { link: Connection },
    ConnectToMaster { host: String, port: u16 },
    Connected { link: Connection },
    Exhausted,
}

/// One discovery session: candidate list, cursor, and outcome.
///
/// The candidate list is append-only and deduplicated by exact string
/// match. The cursor is reset to 0 whenever the list grows, so newly
/// learned sentinels become eligible from the front on the next fallback.
pub struct SentinelDiscovery {
    sentinels: Vec<String>,
    next_sentinel: usize,
    master_name: String,
    timeout: f64,
    status: ConnectionStatus,
    completion: Option<Completion>,
}

impl SentinelDiscovery {
    /// Validate inputs and set up a session. Fails before any network
    /// activity: `sentinels` must be non-empty and `master_name` must be a
    /// non-empty name.
    pub fn new(
        sentinels: Vec<String>,
        master_name: &str,
        completion: Option<Completion>,
        timeout: f64,
    ) -> Result<Self> {
        if sentinels.is_empty() {
            return Err(Error::InvalidSentinels);
        }
        if master_name.is_empty() {
            return Err(Error::InvalidMasterName);
        }

        Ok(Self {
            sentinels,
            next_sentinel: 0,
            master_name: master_name.to_string(),
            timeout,
            status: ConnectionStatus::Unconnected,
            completion,
        })
    }

    /// Session outcome, observable after the completion hook has fired
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// The candidate list, including any sentinels learned during the walk
    pub fn sentinels(&self) -> &[String] {
        &self.sentinels
    }

    pub fn master_name(&self) -> &str {
        &self.master_name
    }

    /// Drive the state machine to a terminal state.
    ///
    /// Returns the master data connection on success. Either way the
    /// completion hook fires exactly once and [`status`](Self::status)
    /// reflects the outcome.
    pub async fn run(&mut self) -> Option<Connection> {
        let mut step = DiscoveryStep::SelectCandidate;

        loop {
            match self.transition(step).await {
                DiscoveryStep::Connected { link } => {
                    self.finish(ConnectionStatus::Connected);
                    return Some(link);
                }
                DiscoveryStep::Exhausted => {
                    self.finish(ConnectionStatus::FailedAfterAllSentinels);
                    return None;
                }
                next => step = next,
            }
        }
    }

    /// Perform one state transition
    async fn transition(&mut self, step: DiscoveryStep) -> DiscoveryStep {
        match step {
            DiscoveryStep::SelectCandidate => {
                if self.next_sentinel < self.sentinels.len() {
                    let endpoint = self.sentinels[self.next_sentinel].clone();
                    self.next_sentinel += 1;
                    DiscoveryStep::ConnectToSentinel { endpoint }
                } else {
                    DiscoveryStep::Exhausted
                }
            }

            DiscoveryStep::ConnectToSentinel { endpoint } => {
                let Some((host, port)) = split_endpoint(&endpoint) else {
                    log::warn!("Skipping malformed sentinel endpoint '{}'", endpoint);
                    return DiscoveryStep::SelectCandidate;
                };

                match connect_with_timeout(host, port, self.timeout).await {
                    Ok(stream) => DiscoveryStep::QuerySentinelList {
                        link: Connection::new(stream),
                    },
                    Err(e) => {
                        log::warn!(
                            "Error connecting to sentinel {}:{} ({}). Trying next sentinel.",
                            host,
                            port,
                            e
                        );
                        DiscoveryStep::SelectCandidate
                    }
                }
            }

            DiscoveryStep::QuerySentinelList { mut link } => {
                let reply = match link
                    .round_trip(&["SENTINEL", "sentinels", &self.master_name])
                    .await
                {
                    Ok(reply) => reply,
                    Err(e) => {
                        log::debug!("Sentinel list query failed: {}", e);
                        return DiscoveryStep::SelectCandidate;
                    }
                };

                let mut appended = false;
                for peer in replies::peer_addresses(&reply) {
                    if !self.sentinels.iter().any(|s| s == &peer) {
                        log::info!(
                            "Discovered new sentinel {} for master '{}'",
                            peer,
                            self.master_name
                        );
                        self.sentinels.push(peer);
                        appended = true;
                    }
                }

                // Newly learned sentinels become eligible from the front
                if appended {
                    self.next_sentinel = 0;
                }

                DiscoveryStep::QueryMasterAddress { link }
            }

            DiscoveryStep::QueryMasterAddress { mut link } => {
                let reply = match link
                    .round_trip(&["SENTINEL", "get-master-addr-by-name", &self.master_name])
                    .await
                {
                    Ok(reply) => reply,
                    Err(e) => {
                        log::debug!("Master address query failed: {}", e);
                        return DiscoveryStep::SelectCandidate;
                    }
                };

                match replies::master_address(&reply) {
                    Some((host, port)) => DiscoveryStep::ConnectToMaster { host, port },
                    None => {
                        log::debug!(
                            "Sentinel has no authoritative address for master '{}'",
                            self.master_name
                        );
                        DiscoveryStep::SelectCandidate
                    }
                }
            }

            DiscoveryStep::ConnectToMaster { host, port } => {
                match connect_with_timeout(&host, port, self.timeout).await {
                    Ok(stream) => DiscoveryStep::Connected {
                        link: Connection::new(stream),
                    },
                    Err(e) => {
                        // The address may be stale; the next sentinel decides
                        log::warn!(
                            "Error connecting to master {}:{} ({}). Trying next sentinel.",
                            host,
                            port,
                            e
                        );
                        DiscoveryStep::SelectCandidate
                    }
                }
            }

            terminal @ (DiscoveryStep::Connected { .. } | DiscoveryStep::Exhausted) => terminal,
        }
    }

    /// Record the outcome and fire the completion hook.
    ///
    /// The hook is consumed by `take()`, so a stray late event can never
    /// fire it a second time.
    fn finish(&mut self, status: ConnectionStatus) {
        self.status = status;
        if let Some(completion) = self.completion.take() {
            completion();
        }
    }
}
