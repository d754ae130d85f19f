//! Chroma vector database test container
//!
//! Starts [Chroma](https://www.trychroma.com/) in Docker and resolves its REST
//! endpoint. Chroma clients are not part of this crate; point any HTTP client
//! or Chroma SDK at [`ChromaContainer::rest_endpoint`].

use std::path::PathBuf;

use tc_modules_core::{
    AccessMode, ContainerAsyncHandle, ContainerHandle, HostResolver, ImageError, ImageRef,
    NetworkAttachment, ResolveError,
};
use testcontainers::core::wait::HttpWaitStrategy;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ContainerRequest, GenericImage, ImageExt};
use thiserror::Error;
use tracing::info;

/// REST API port
pub const REST_PORT: ContainerPort = ContainerPort::Tcp(8000);

/// Path answering 200 once the server is ready
pub const HEARTBEAT_PATH: &str = "/api/v2/heartbeat";

/// Environment variable overriding the image
pub const IMAGE_ENV: &str = "CHROMA_IMAGE";

const DEFAULT_IMAGE: &str = "chromadb/chroma:1.4.0";

/// Get the Docker image to use for Chroma
pub fn chroma_image() -> Result<ImageRef, ImageError> {
    ImageRef::from_env_or(IMAGE_ENV, DEFAULT_IMAGE)
}

/// Chroma module errors
#[derive(Debug, Error)]
pub enum ChromaError {
    #[error("host authority: {0}")]
    Authority(#[from] ResolveError),

    #[error("chroma image: {0}")]
    Image(#[from] ImageError),

    #[error("chroma container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
}

/// Configuration for a Chroma container
#[derive(Debug, Clone)]
pub struct ChromaBuilder {
    image: Option<ImageRef>,
    network: Option<NetworkAttachment>,
    env: Vec<(String, String)>,
    files: Vec<(PathBuf, String)>,
}

impl Default for ChromaBuilder {
    fn default() -> Self {
        Self {
            image: None,
            network: None,
            env: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl ChromaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// The image to start, read from `CHROMA_IMAGE` unless set explicitly
    pub fn image(&self) -> Result<ImageRef, ImageError> {
        self.image.clone().map_or_else(chroma_image, Ok)
    }

    pub fn with_network_alias(
        mut self,
        alias: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        self.network = Some(NetworkAttachment::new(alias, network));
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Copy a host file into the container before it starts
    pub fn with_file(
        mut self,
        host_path: impl Into<PathBuf>,
        container_path: impl Into<String>,
    ) -> Self {
        self.files.push((host_path.into(), container_path.into()));
        self
    }

    /// Build the container request without starting it
    pub fn request(&self) -> Result<ContainerRequest<GenericImage>, ChromaError> {
        Ok(self.request_for(&self.image()?))
    }

    fn request_for(&self, image: &ImageRef) -> ContainerRequest<GenericImage> {
        let heartbeat = HttpWaitStrategy::new(HEARTBEAT_PATH)
            .with_port(REST_PORT)
            .with_expected_status_code(200_u16);

        let mut request = image
            .to_generic_image()
            .with_exposed_port(REST_PORT)
            .with_wait_for(WaitFor::http(heartbeat))
            .with_env_var("ANONYMIZED_TELEMETRY", "FALSE");

        if let Some(attachment) = &self.network {
            request = attachment.apply(request);
        }
        for (name, value) in &self.env {
            request = request.with_env_var(name.clone(), value.clone());
        }
        for (host_path, container_path) in &self.files {
            request = request.with_copy_to(container_path.clone(), host_path.clone());
        }

        request
    }

    /// Start Chroma and wait for its heartbeat
    pub async fn start(self) -> Result<ChromaContainer, ChromaError> {
        let image = self.image()?;
        let container = self.request_for(&image).start().await?;
        info!(
            image = %image,
            container_id = %container.id(),
            "Chroma container started"
        );

        let mut handle = ContainerAsyncHandle::new(container);
        if let Some(attachment) = &self.network {
            handle = handle.attached_as(attachment.alias.clone());
        }
        Ok(ChromaContainer::from_handle(handle))
    }
}

/// A running Chroma server
pub struct ChromaContainer<H = ContainerAsyncHandle<GenericImage>> {
    resolver: HostResolver<H>,
}

impl<H: ContainerHandle> ChromaContainer<H> {
    pub fn from_handle(handle: H) -> Self {
        Self {
            resolver: HostResolver::new(handle),
        }
    }

    pub fn resolver(&self) -> &HostResolver<H> {
        &self.resolver
    }

    /// Base URL of the REST API, e.g. `http://localhost:32768`
    pub async fn rest_endpoint(&self, mode: AccessMode) -> Result<String, ChromaError> {
        let authority = self.resolver.authority(REST_PORT, mode).await?;
        Ok(format!("http://{}", authority))
    }
}

impl ChromaContainer {
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        self.resolver.handle().container()
    }

    /// Stop and remove the container
    pub async fn stop(self) -> Result<(), ChromaError> {
        self.resolver.into_handle().into_inner().stop().await?;
        Ok(())
    }
}
