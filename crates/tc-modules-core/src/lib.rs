//! Shared building blocks for tc-modules
//!
//! This crate provides the pieces every container module needs:
//! - [`ContainerHandle`]: the queries a module makes against a running container
//! - [`HostResolver`]: turns an exposed port plus an [`AccessMode`] into a
//!   dialable `host:port`, memoizing host lookups per container
//! - [`ImageRef`]: image references with environment overrides
//! - [`NetworkAttachment`]: joins a container to a user-defined network under an alias

pub mod access;
pub mod error;
pub mod handle;
pub mod image;
pub mod logging;
pub mod network;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use access::AccessMode;
pub use error::{BoxedError, HandleError, ImageError, ResolveError};
pub use handle::{ContainerAsyncHandle, ContainerHandle};
pub use image::ImageRef;
pub use network::NetworkAttachment;
pub use resolver::HostResolver;

/// Initialize the rustls crypto provider.
///
/// Must be called before any TLS client or server is built. Safe to call multiple times.
pub fn init_crypto_provider() {
    // The only possible error is "provider already installed" which is benign
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
