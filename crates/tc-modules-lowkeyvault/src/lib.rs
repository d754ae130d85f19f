//! Lowkey Vault test container
//!
//! [Lowkey Vault](https://github.com/nagyesta/lowkey-vault) simulates the Azure
//! Key Vault API. This crate starts it in Docker and hands out everything a
//! test needs to talk to it:
//! - the API connection URL, from the test runner or from another container
//! - the managed identity endpoint and header
//! - an HTTP client that trusts the container's self-issued certificate
//!
//! ```rust,no_run
//! use tc_modules_core::AccessMode;
//! use tc_modules_lowkeyvault::LowkeyVaultBuilder;
//!
//! # async fn demo() -> Result<(), tc_modules_lowkeyvault::VaultError> {
//! let vault = LowkeyVaultBuilder::new().start().await?;
//! let url = vault.connection_url(AccessMode::Local).await?;
//! let client = vault.client().await?;
//! let response = client.get(format!("{url}/ping")).send().await;
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod error;
pub mod trust;

pub use container::{LowkeyVault, LowkeyVaultBuilder};
pub use error::VaultError;

use tc_modules_core::{ImageError, ImageRef};
use testcontainers::core::ContainerPort;

/// Port of the Key Vault API endpoints (HTTPS)
pub const API_PORT: ContainerPort = ContainerPort::Tcp(8443);

/// Port of the metadata endpoints (plain HTTP)
pub const METADATA_PORT: ContainerPort = ContainerPort::Tcp(8080);

/// Log line printed once the application has started
pub const READY_MESSAGE: &str = "Started LowkeyVaultApp in ";

/// Path of the managed identity token endpoint on the metadata port
pub const IDENTITY_TOKEN_PATH: &str = "/metadata/identity/oauth2/token";

/// Value of `IDENTITY_HEADER` for the managed identity simulation
pub const IDENTITY_HEADER: &str = "header";

/// Environment variable overriding the image
pub const IMAGE_ENV: &str = "LOWKEY_VAULT_IMAGE";

const DEFAULT_IMAGE: &str = "nagyesta/lowkey-vault:2.7.1";

/// Get the Docker image to use for the vault
pub fn vault_image() -> Result<ImageRef, ImageError> {
    ImageRef::from_env_or(IMAGE_ENV, DEFAULT_IMAGE)
}
