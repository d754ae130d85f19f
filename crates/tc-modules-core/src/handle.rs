//! Container handle abstraction
//!
//! [`ContainerHandle`] is the set of queries the resolver makes against a
//! running container. [`ContainerAsyncHandle`] implements it on top of a
//! testcontainers [`ContainerAsync`], asking the Docker daemon directly for
//! network membership since testcontainers does not expose it.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::models::EndpointSettings;
use bollard::Docker;
use testcontainers::core::ContainerPort;
use testcontainers::{ContainerAsync, Image};
use tracing::debug;

use crate::error::HandleError;

/// Length of the short container ID Docker registers as an alias
const SHORT_ID_LEN: usize = 12;

/// Queries against a running container
#[async_trait]
pub trait ContainerHandle: Send + Sync {
    /// Host through which the container's mapped ports are reachable
    async fn host(&self) -> Result<String, HandleError>;

    /// Host-side port mapped to the given exposed port
    async fn mapped_port(&self, port: ContainerPort) -> Result<u16, HandleError>;

    /// Names of the networks the container is attached to
    async fn networks(&self) -> Result<Vec<String>, HandleError>;

    /// Aliases of the container, keyed by network name
    ///
    /// Every network the container belongs to has an entry, with an empty
    /// list when the container has no alias there.
    async fn network_aliases(&self) -> Result<HashMap<String, Vec<String>>, HandleError>;
}

/// [`ContainerHandle`] backed by a testcontainers container
///
/// Owns the container; dropping the handle removes it.
pub struct ContainerAsyncHandle<I: Image> {
    container: ContainerAsync<I>,
    attached_alias: Option<String>,
}

impl<I: Image> ContainerAsyncHandle<I> {
    pub fn new(container: ContainerAsync<I>) -> Self {
        Self {
            container,
            attached_alias: None,
        }
    }

    /// Record the alias the container was started under by
    /// [`NetworkAttachment`](crate::NetworkAttachment)
    ///
    /// The attachment names the container after its alias, and Docker
    /// registers container names as DNS names without always listing them as
    /// aliases. With this set, a user-defined network on which Docker reports
    /// no alias reports this one instead. Containers without it report exactly
    /// what Docker lists.
    pub fn attached_as(mut self, alias: impl Into<String>) -> Self {
        self.attached_alias = Some(alias.into());
        self
    }

    /// The underlying testcontainers container
    pub fn container(&self) -> &ContainerAsync<I> {
        &self.container
    }

    /// Release the underlying container
    pub fn into_inner(self) -> ContainerAsync<I> {
        self.container
    }

    async fn inspect_networks(&self) -> Result<HashMap<String, EndpointSettings>, HandleError> {
        let docker = Docker::connect_with_local_defaults()?;
        let id = self.container.id();
        debug!(container_id = %id, "Inspecting container networks");

        let info = docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;

        info.network_settings
            .and_then(|settings| settings.networks)
            .ok_or_else(|| HandleError::MissingNetworkSettings(id.to_string()))
    }
}

#[async_trait]
impl<I: Image> ContainerHandle for ContainerAsyncHandle<I> {
    async fn host(&self) -> Result<String, HandleError> {
        let host = self.container.get_host().await?;
        Ok(host.to_string())
    }

    async fn mapped_port(&self, port: ContainerPort) -> Result<u16, HandleError> {
        Ok(self.container.get_host_port_ipv4(port).await?)
    }

    async fn networks(&self) -> Result<Vec<String>, HandleError> {
        let mut names: Vec<String> = self.inspect_networks().await?.into_keys().collect();
        names.sort();
        Ok(names)
    }

    async fn network_aliases(&self) -> Result<HashMap<String, Vec<String>>, HandleError> {
        let networks = self.inspect_networks().await?;
        Ok(aliases_by_network(
            self.container.id(),
            networks,
            self.attached_alias.as_deref(),
        ))
    }
}

/// Aliases per network, with an entry for every network
fn aliases_by_network(
    container_id: &str,
    networks: HashMap<String, EndpointSettings>,
    attached_alias: Option<&str>,
) -> HashMap<String, Vec<String>> {
    networks
        .into_iter()
        .map(|(network, endpoint)| {
            let mut names = user_aliases(container_id, endpoint.aliases.unwrap_or_default());
            if names.is_empty() && is_user_defined(&network) {
                names.extend(attached_alias.map(str::to_string));
            }
            (network, names)
        })
        .collect()
}

/// Aliases with the daemon-generated short container ID removed.
fn user_aliases(container_id: &str, aliases: Vec<String>) -> Vec<String> {
    aliases
        .into_iter()
        .filter(|alias| !is_short_id(container_id, alias))
        .collect()
}

fn is_short_id(container_id: &str, alias: &str) -> bool {
    alias.len() == SHORT_ID_LEN && container_id.starts_with(alias)
}

fn is_user_defined(network: &str) -> bool {
    !matches!(network, "bridge" | "host" | "none")
}
