//! Error types for container queries and address resolution

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error for wrapping orchestration-layer errors
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Failure of a single query against a running container
#[derive(Debug, Error)]
pub enum HandleError {
    /// The testcontainers runtime rejected the query
    #[error("testcontainers query failed: {0}")]
    Testcontainers(#[from] testcontainers::TestcontainersError),

    /// The Docker daemon rejected the inspect call
    #[error("docker inspect failed: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Inspect returned no network settings at all
    #[error("container {0} reports no network settings")]
    MissingNetworkSettings(String),

    /// Any other query failure
    #[error("container query failed: {0}")]
    Query(String),
}

/// Image references that cannot be turned into a `name:tag` pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("empty image reference")]
    Empty,

    /// `name@sha256:...` references; containers are started from `name:tag`
    #[error("digest image references are not supported: {0}")]
    Digest(String),
}

/// Address resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The container's host could not be determined
    #[error("host lookup failed: {source}")]
    HostLookup {
        #[source]
        source: BoxedError,
    },

    /// No host mapping could be found for the exposed port
    #[error("port lookup failed for {port}: {source}")]
    PortLookup {
        port: String,
        #[source]
        source: BoxedError,
    },

    /// Network membership could not be listed
    #[error("network lookup failed: {source}")]
    NetworkLookup {
        #[source]
        source: BoxedError,
    },

    /// Network aliases could not be listed
    #[error("network alias lookup failed: {source}")]
    AliasLookup {
        #[source]
        source: BoxedError,
    },

    /// Network mode needs exactly one user-defined network
    #[error("the container must have exactly one network, but it has {0}")]
    WrongNetworkCount(usize),

    /// No alias entry was reported for any network
    #[error("no network aliases found in the container")]
    NoAliases,

    /// Network mode needs exactly one alias on the container's network
    #[error("the container must have exactly one network alias on {network}, but it has {count}")]
    WrongAliasCount { network: String, count: usize },

    /// The requested access mode is not one this crate understands
    #[error("unsupported access mode: {0}")]
    UnsupportedAccessMode(String),
}

impl ResolveError {
    /// Create a host lookup error with source
    pub fn host_lookup(source: impl Into<BoxedError>) -> Self {
        Self::HostLookup {
            source: source.into(),
        }
    }

    /// Create a port lookup error with source
    pub fn port_lookup(port: impl ToString, source: impl Into<BoxedError>) -> Self {
        Self::PortLookup {
            port: port.to_string(),
            source: source.into(),
        }
    }

    /// Create a network lookup error with source
    pub fn network_lookup(source: impl Into<BoxedError>) -> Self {
        Self::NetworkLookup {
            source: source.into(),
        }
    }

    /// Create an alias lookup error with source
    pub fn alias_lookup(source: impl Into<BoxedError>) -> Self {
        Self::AliasLookup {
            source: source.into(),
        }
    }

    /// True for errors caused by how the container was configured rather
    /// than by a failed query.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::WrongNetworkCount(_)
                | Self::NoAliases
                | Self::WrongAliasCount { .. }
                | Self::UnsupportedAccessMode(_)
        )
    }
}
