//! Network attachment for module containers
//!
//! Joins a container to a user-defined network so that other containers on the
//! same network can reach it by alias. The runner creates the network if it
//! does not exist yet.

use testcontainers::{ContainerRequest, Image, ImageExt};

/// A user-defined network and the alias a container should answer to on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub network: String,
    pub alias: String,
}

impl NetworkAttachment {
    pub fn new(alias: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            alias: alias.into(),
        }
    }

    /// Attach the request to the network
    ///
    /// The alias is used as the container name, which Docker registers as a
    /// DNS name on user-defined networks. Aliases must therefore be unique
    /// per Docker daemon.
    pub fn apply<I: Image>(&self, request: ContainerRequest<I>) -> ContainerRequest<I> {
        request
            .with_network(self.network.clone())
            .with_container_name(self.alias.clone())
    }
}
