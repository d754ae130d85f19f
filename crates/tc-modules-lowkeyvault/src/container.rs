//! Docker container management for Lowkey Vault
//!
//! Uses testcontainers to manage the vault lifecycle.

use tc_modules_core::{
    AccessMode, ContainerAsyncHandle, ContainerHandle, HostResolver, ImageError, ImageRef,
    NetworkAttachment,
};
use testcontainers::core::WaitFor;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ContainerRequest, GenericImage, ImageExt};
use tracing::info;

use crate::error::VaultError;
use crate::{trust, API_PORT, IDENTITY_HEADER, IDENTITY_TOKEN_PATH, METADATA_PORT, READY_MESSAGE};

/// Lets the vault accept requests on whatever port the client used
const RELAXED_PORTS_ENV: &str = "LOWKEY_VAULT_RELAXED_PORTS";

/// Maps vault host names to aliases
const ALIASES_ENV: &str = "LOWKEY_VAULT_ALIASES";

/// Configuration for a vault container
#[derive(Debug, Clone)]
pub struct LowkeyVaultBuilder {
    image: Option<ImageRef>,
    network: Option<NetworkAttachment>,
    env: Vec<(String, String)>,
}

impl Default for LowkeyVaultBuilder {
    fn default() -> Self {
        Self {
            image: None,
            network: None,
            env: Vec::new(),
        }
    }
}

impl LowkeyVaultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `image` instead of the default or `LOWKEY_VAULT_IMAGE`
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// The image to start, read from the environment unless set explicitly
    pub fn image(&self) -> Result<ImageRef, ImageError> {
        self.image.clone().map_or_else(crate::vault_image, Ok)
    }

    /// Attach the vault to `network` under `alias`
    ///
    /// Also registers the alias for the default `localhost` vault, so requests
    /// addressed to `https://<alias>:<port>` are routed to it. The `<port>`
    /// placeholder is filled in by the vault at startup.
    pub fn with_network_alias(
        mut self,
        alias: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        self.network = Some(NetworkAttachment::new(alias, network));
        self
    }

    /// Set an extra environment variable; later values win
    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Build the container request without starting it
    pub fn request(&self) -> Result<ContainerRequest<GenericImage>, VaultError> {
        Ok(self.request_for(&self.image()?))
    }

    fn request_for(&self, image: &ImageRef) -> ContainerRequest<GenericImage> {
        // GenericImage methods first (with_exposed_port, with_wait_for),
        // then ContainerRequest methods (with_env_var, with_network)
        let mut request = image
            .to_generic_image()
            .with_exposed_port(API_PORT)
            .with_exposed_port(METADATA_PORT)
            .with_wait_for(WaitFor::message_on_stdout(READY_MESSAGE))
            .with_env_var(RELAXED_PORTS_ENV, "true");

        if let Some(attachment) = &self.network {
            request = attachment
                .apply(request)
                .with_env_var(ALIASES_ENV, format!("localhost={}:<port>", attachment.alias));
        }

        for (name, value) in &self.env {
            request = request.with_env_var(name.clone(), value.clone());
        }

        request
    }

    /// Start the vault and wait until it reports readiness
    pub async fn start(self) -> Result<LowkeyVault, VaultError> {
        let image = self.image()?;
        let container = self.request_for(&image).start().await?;
        info!(
            image = %image,
            container_id = %container.id(),
            "Lowkey Vault container started"
        );

        let mut handle = ContainerAsyncHandle::new(container);
        if let Some(attachment) = &self.network {
            handle = handle.attached_as(attachment.alias.clone());
        }
        Ok(LowkeyVault::from_handle(handle))
    }
}

/// A running vault
pub struct LowkeyVault<H = ContainerAsyncHandle<GenericImage>> {
    resolver: HostResolver<H>,
}

impl<H: ContainerHandle> LowkeyVault<H> {
    pub fn from_handle(handle: H) -> Self {
        Self {
            resolver: HostResolver::new(handle),
        }
    }

    pub fn resolver(&self) -> &HostResolver<H> {
        &self.resolver
    }

    /// Base URL of the Key Vault API, e.g. `https://localhost:49153`
    pub async fn connection_url(&self, mode: AccessMode) -> Result<String, VaultError> {
        let authority = self.resolver.authority(API_PORT, mode).await?;
        Ok(format!("https://{}", authority))
    }

    /// Value for `IDENTITY_ENDPOINT` in the managed identity simulation
    pub async fn identity_endpoint(&self, mode: AccessMode) -> Result<String, VaultError> {
        let authority = self.resolver.authority(METADATA_PORT, mode).await?;
        Ok(format!("http://{}{}", authority, IDENTITY_TOKEN_PATH))
    }

    /// Value for `IDENTITY_HEADER` in the managed identity simulation
    pub fn identity_header(&self) -> &'static str {
        IDENTITY_HEADER
    }

    /// HTTP client that trusts the vault's default certificate
    ///
    /// See [`trust`] for how the certificate is obtained.
    pub async fn client(&self) -> Result<reqwest::Client, VaultError> {
        trust::trusting_client(&self.resolver).await
    }
}

impl LowkeyVault {
    /// The underlying container
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        self.resolver.handle().container()
    }

    /// Stop and remove the container
    pub async fn stop(self) -> Result<(), VaultError> {
        let container = self.resolver.into_handle().into_inner();
        container.stop().await?;
        Ok(())
    }
}
