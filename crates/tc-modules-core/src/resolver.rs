//! Host authority resolution
//!
//! Resolves `host:port` authorities for a container's exposed ports.
//!
//! # Access Modes
//!
//! - [`AccessMode::Local`]: the container host plus the host-mapped port.
//!   The host is looked up once; the mapped port is looked up on every call.
//! - [`AccessMode::Network`]: the container's single alias on its single
//!   user-defined network, plus the exposed port's own number. Ports are not
//!   remapped inside a user-defined network.
//!
//! Host lookups are cached per resolver in compute-once cells, so concurrent
//! callers share the first successful lookup. Failed lookups are not cached.

use testcontainers::core::ContainerPort;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::access::AccessMode;
use crate::error::ResolveError;
use crate::handle::ContainerHandle;

/// Resolves host authorities for one container
pub struct HostResolver<H> {
    handle: H,
    local_host: OnceCell<String>,
    network_host: OnceCell<String>,
}

impl<H: ContainerHandle> HostResolver<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            local_host: OnceCell::new(),
            network_host: OnceCell::new(),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }

    /// Resolve the `host:port` authority for `port` as seen from `mode`
    ///
    /// # Errors
    ///
    /// Lookup failures are wrapped with the step that failed. Network mode
    /// additionally fails with [`ResolveError::WrongNetworkCount`],
    /// [`ResolveError::NoAliases`] or [`ResolveError::WrongAliasCount`] when
    /// the container is not attached to exactly one network under exactly
    /// one alias.
    pub async fn authority(
        &self,
        port: ContainerPort,
        mode: AccessMode,
    ) -> Result<String, ResolveError> {
        match mode {
            AccessMode::Local => {
                let host = self.local_host().await?;
                let mapped = self
                    .handle
                    .mapped_port(port)
                    .await
                    .map_err(|e| ResolveError::port_lookup(describe_port(port), e))?;
                Ok(format!("{}:{}", host, mapped))
            }
            AccessMode::Network => {
                let host = self.network_host().await?;
                Ok(format!("{}:{}", host, port.as_u16()))
            }
        }
    }

    /// Resolve an authority for a raw access mode value
    ///
    /// Unknown values fail with [`ResolveError::UnsupportedAccessMode`]
    /// before the container is queried.
    pub async fn authority_for<M>(
        &self,
        port: ContainerPort,
        mode: M,
    ) -> Result<String, ResolveError>
    where
        M: TryInto<AccessMode, Error = ResolveError>,
    {
        let mode = mode.try_into()?;
        self.authority(port, mode).await
    }

    /// Host reachable from the test runner
    pub async fn local_host(&self) -> Result<&str, ResolveError> {
        let host = self
            .local_host
            .get_or_try_init(|| async {
                let host = self
                    .handle
                    .host()
                    .await
                    .map_err(ResolveError::host_lookup)?;
                debug!(host = %host, "Resolved local host");
                Ok::<_, ResolveError>(host)
            })
            .await?;
        Ok(host.as_str())
    }

    /// Host reachable from containers on the same network
    pub async fn network_host(&self) -> Result<&str, ResolveError> {
        let host = self
            .network_host
            .get_or_try_init(|| self.lookup_network_host())
            .await?;
        Ok(host.as_str())
    }

    async fn lookup_network_host(&self) -> Result<String, ResolveError> {
        let networks = self
            .handle
            .networks()
            .await
            .map_err(ResolveError::network_lookup)?;
        if networks.len() != 1 {
            return Err(ResolveError::WrongNetworkCount(networks.len()));
        }
        let network = &networks[0];

        let mut aliases = self
            .handle
            .network_aliases()
            .await
            .map_err(ResolveError::alias_lookup)?;
        if aliases.is_empty() {
            return Err(ResolveError::NoAliases);
        }

        let mut names = aliases.remove(network).unwrap_or_default();
        if names.len() != 1 {
            return Err(ResolveError::WrongAliasCount {
                network: network.clone(),
                count: names.len(),
            });
        }

        let host = names.remove(0);
        debug!(network = %network, host = %host, "Resolved network host");
        Ok(host)
    }
}

/// `port/protocol` form used in error messages
pub fn describe_port(port: ContainerPort) -> String {
    let protocol = match port {
        ContainerPort::Tcp(_) => "tcp",
        ContainerPort::Udp(_) => "udp",
        _ => "sctp",
    };
    format!("{}/{}", port.as_u16(), protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubHandle;

    const API_PORT: ContainerPort = ContainerPort::Tcp(8443);

    #[tokio::test]
    async fn test_local_mode_uses_mapped_port() {
        let handle = StubHandle::new("localhost").with_mapped_port(8443, 49153);
        let resolver = HostResolver::new(handle);

        let authority = resolver.authority(API_PORT, AccessMode::Local).await.unwrap();
        assert_eq!(authority, "localhost:49153");
    }

    #[tokio::test]
    async fn test_local_mode_caches_host_but_not_port() {
        let handle = StubHandle::new("localhost").with_mapped_port(8443, 49153);
        let resolver = HostResolver::new(handle);

        resolver.authority(API_PORT, AccessMode::Local).await.unwrap();
        resolver.authority(API_PORT, AccessMode::Local).await.unwrap();

        let calls = resolver.handle().calls();
        assert_eq!(calls.host, 1);
        assert_eq!(calls.mapped_port, 2);
    }

    #[tokio::test]
    async fn test_local_mode_picks_up_remapped_port() {
        let handle = StubHandle::new("localhost").with_mapped_port(8443, 49153);
        let resolver = HostResolver::new(handle);

        resolver.authority(API_PORT, AccessMode::Local).await.unwrap();
        resolver.handle().set_mapped_port(8443, 50000);

        let authority = resolver.authority(API_PORT, AccessMode::Local).await.unwrap();
        assert_eq!(authority, "localhost:50000");
    }

    #[tokio::test]
    async fn test_local_mode_unmapped_port() {
        let handle = StubHandle::new("localhost");
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Local)
            .await
            .unwrap_err();
        match err {
            ResolveError::PortLookup { port, .. } => assert_eq!(port, "8443/tcp"),
            other => panic!("Expected PortLookup, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_mode_host_failure_is_not_cached() {
        let handle = StubHandle::new("localhost")
            .with_mapped_port(8443, 49153)
            .failing_host();
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Local)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::HostLookup { .. }));
        assert_eq!(resolver.handle().calls().mapped_port, 0);

        resolver.handle().recover_host();
        let authority = resolver.authority(API_PORT, AccessMode::Local).await.unwrap();
        assert_eq!(authority, "localhost:49153");
        assert_eq!(resolver.handle().calls().host, 2);
    }

    #[tokio::test]
    async fn test_network_mode_uses_alias_and_internal_port() {
        let handle = StubHandle::new("localhost")
            .with_mapped_port(8443, 49153)
            .with_network("tc-net", &["lowkey-vault"]);
        let resolver = HostResolver::new(handle);

        let authority = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap();
        assert_eq!(authority, "lowkey-vault:8443");
        assert_eq!(resolver.handle().calls().mapped_port, 0);
    }

    #[tokio::test]
    async fn test_network_mode_is_cached() {
        let handle = StubHandle::new("localhost").with_network("tc-net", &["lowkey-vault"]);
        let resolver = HostResolver::new(handle);

        let first = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap();
        let second = resolver
            .authority(ContainerPort::Tcp(8080), AccessMode::Network)
            .await
            .unwrap();

        assert_eq!(first, "lowkey-vault:8443");
        assert_eq!(second, "lowkey-vault:8080");

        let calls = resolver.handle().calls();
        assert_eq!(calls.networks, 1);
        assert_eq!(calls.network_aliases, 1);
        assert_eq!(calls.host, 0);
    }

    #[tokio::test]
    async fn test_network_mode_without_networks() {
        let resolver = HostResolver::new(StubHandle::new("localhost"));

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::WrongNetworkCount(0)));
        assert_eq!(resolver.handle().calls().network_aliases, 0);
    }

    #[tokio::test]
    async fn test_network_mode_with_two_networks() {
        let handle = StubHandle::new("localhost")
            .with_network("net-a", &["vault"])
            .with_network("net-b", &["vault"]);
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::WrongNetworkCount(2)));
    }

    #[tokio::test]
    async fn test_network_mode_with_zero_aliases_on_network() {
        let handle = StubHandle::new("localhost").with_network("tc-net", &[]);
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        match err {
            ResolveError::WrongAliasCount { network, count } => {
                assert_eq!(network, "tc-net");
                assert_eq!(count, 0);
            }
            other => panic!("Expected WrongAliasCount, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_mode_with_empty_alias_map() {
        let handle = StubHandle::new("localhost").with_unlisted_network("tc-net");
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoAliases));
    }

    #[tokio::test]
    async fn test_network_mode_without_alias_on_own_network() {
        let handle = StubHandle::new("localhost")
            .with_unlisted_network("tc-net")
            .with_foreign_aliases("other-net", &["vault"]);
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        match err {
            ResolveError::WrongAliasCount { network, count } => {
                assert_eq!(network, "tc-net");
                assert_eq!(count, 0);
            }
            other => panic!("Expected WrongAliasCount, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_mode_with_two_aliases() {
        let handle = StubHandle::new("localhost").with_network("tc-net", &["vault", "keys"]);
        let resolver = HostResolver::new(handle);

        let err = resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::WrongAliasCount { count: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_network_failure_is_not_cached() {
        let handle = StubHandle::new("localhost").with_network("tc-net", &["vault", "keys"]);
        let resolver = HostResolver::new(handle);

        assert!(resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .is_err());
        assert!(resolver
            .authority(API_PORT, AccessMode::Network)
            .await
            .is_err());
        assert_eq!(resolver.handle().calls().networks, 2);
    }

    #[tokio::test]
    async fn test_modes_are_cached_independently() {
        let handle = StubHandle::new("localhost")
            .with_mapped_port(8443, 49153)
            .with_network("tc-net", &["vault"]);
        let resolver = HostResolver::new(handle);

        assert_eq!(
            resolver.authority(API_PORT, AccessMode::Local).await.unwrap(),
            "localhost:49153"
        );
        assert_eq!(
            resolver
                .authority(API_PORT, AccessMode::Network)
                .await
                .unwrap(),
            "vault:8443"
        );

        let calls = resolver.handle().calls();
        assert_eq!(calls.host, 1);
        assert_eq!(calls.networks, 1);
    }

    #[tokio::test]
    async fn test_unsupported_mode_performs_no_queries() {
        let handle = StubHandle::new("localhost")
            .with_mapped_port(8443, 49153)
            .with_network("tc-net", &["vault"]);
        let resolver = HostResolver::new(handle);

        let err = resolver.authority_for(API_PORT, 7).await.unwrap_err();
        match err {
            ResolveError::UnsupportedAccessMode(value) => assert_eq!(value, "7"),
            other => panic!("Expected UnsupportedAccessMode, got {other:?}"),
        }

        let calls = resolver.handle().calls();
        assert_eq!(calls.total(), 0);
    }

    #[tokio::test]
    async fn test_raw_mode_values_resolve() {
        let handle = StubHandle::new("127.0.0.1").with_mapped_port(8080, 32768);
        let resolver = HostResolver::new(handle);

        let authority = resolver
            .authority_for(ContainerPort::Tcp(8080), 0)
            .await
            .unwrap();
        assert_eq!(authority, "127.0.0.1:32768");
    }

    #[tokio::test]
    async fn test_concurrent_local_resolution_queries_host_once() {
        let handle = StubHandle::new("localhost").with_mapped_port(8443, 49153);
        let resolver = HostResolver::new(handle);

        let (a, b, c) = tokio::join!(
            resolver.authority(API_PORT, AccessMode::Local),
            resolver.authority(API_PORT, AccessMode::Local),
            resolver.authority(API_PORT, AccessMode::Local),
        );
        assert_eq!(a.unwrap(), "localhost:49153");
        assert_eq!(b.unwrap(), "localhost:49153");
        assert_eq!(c.unwrap(), "localhost:49153");
        assert_eq!(resolver.handle().calls().host, 1);
    }

    #[test]
    fn test_describe_port() {
        assert_eq!(describe_port(ContainerPort::Tcp(5432)), "5432/tcp");
        assert_eq!(describe_port(ContainerPort::Udp(53)), "53/udp");
    }
}
