//! Test utilities for tc-modules tests.
//!
//! Provides an in-memory [`ContainerHandle`] that records how often each
//! query is made, so caching behaviour can be asserted without Docker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use testcontainers::core::ContainerPort;

use crate::error::HandleError;
use crate::handle::ContainerHandle;

/// Number of queries made against a [`StubHandle`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub host: usize,
    pub mapped_port: usize,
    pub networks: usize,
    pub network_aliases: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.host + self.mapped_port + self.networks + self.network_aliases
    }
}

/// In-memory container handle with call counting
#[derive(Debug, Default)]
pub struct StubHandle {
    host: String,
    host_fails: AtomicBool,
    ports: Mutex<HashMap<u16, u16>>,
    networks: Vec<String>,
    aliases: HashMap<String, Vec<String>>,
    host_calls: AtomicUsize,
    port_calls: AtomicUsize,
    network_calls: AtomicUsize,
    alias_calls: AtomicUsize,
}

impl StubHandle {
    /// Creates a handle reachable through `host`, with no ports and no networks.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Maps an exposed port to a host port.
    pub fn with_mapped_port(self, exposed: u16, mapped: u16) -> Self {
        self.set_mapped_port(exposed, mapped);
        self
    }

    /// Attaches the container to `network` with the given aliases.
    ///
    /// The network gets an alias entry even when `aliases` is empty.
    pub fn with_network(mut self, network: &str, aliases: &[&str]) -> Self {
        self.networks.push(network.to_string());
        self.aliases.insert(
            network.to_string(),
            aliases.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Attaches the container to `network` without any alias entry for it.
    pub fn with_unlisted_network(mut self, network: &str) -> Self {
        self.networks.push(network.to_string());
        self
    }

    /// Records aliases for a network the container is not a member of.
    pub fn with_foreign_aliases(mut self, network: &str, aliases: &[&str]) -> Self {
        self.aliases.insert(
            network.to_string(),
            aliases.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Makes host lookups fail until [`StubHandle::recover_host`] is called.
    pub fn failing_host(self) -> Self {
        self.host_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn recover_host(&self) {
        self.host_fails.store(false, Ordering::SeqCst);
    }

    pub fn set_mapped_port(&self, exposed: u16, mapped: u16) {
        self.ports
            .lock()
            .expect("port map lock poisoned")
            .insert(exposed, mapped);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            host: self.host_calls.load(Ordering::SeqCst),
            mapped_port: self.port_calls.load(Ordering::SeqCst),
            networks: self.network_calls.load(Ordering::SeqCst),
            network_aliases: self.alias_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl ContainerHandle for StubHandle {
    async fn host(&self) -> Result<String, HandleError> {
        self.host_calls.fetch_add(1, Ordering::SeqCst);
        if self.host_fails.load(Ordering::SeqCst) {
            return Err(HandleError::Query("host unavailable".to_string()));
        }
        Ok(self.host.clone())
    }

    async fn mapped_port(&self, port: ContainerPort) -> Result<u16, HandleError> {
        self.port_calls.fetch_add(1, Ordering::SeqCst);
        self.ports
            .lock()
            .expect("port map lock poisoned")
            .get(&port.as_u16())
            .copied()
            .ok_or_else(|| HandleError::Query(format!("no mapping for {port:?}")))
    }

    async fn networks(&self) -> Result<Vec<String>, HandleError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.networks.clone())
    }

    async fn network_aliases(&self) -> Result<HashMap<String, Vec<String>>, HandleError> {
        self.alias_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.aliases.clone())
    }
}
