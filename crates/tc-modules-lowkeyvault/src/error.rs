//! Lowkey Vault module errors

use tc_modules_core::{ImageError, ResolveError};
use thiserror::Error;

/// Errors from the Lowkey Vault module
#[derive(Debug, Error)]
pub enum VaultError {
    /// The container's address could not be resolved
    #[error("host authority: {0}")]
    Authority(#[from] ResolveError),

    /// The metadata request could not be sent
    #[error("get content from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The metadata endpoint answered with a non-OK status, or its body
    /// could not be read
    #[error("content not found at {url}")]
    ContentNotFound {
        url: String,
        status: u16,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The default certificate password is not UTF-8
    #[error("default cert password: {0}")]
    PasswordEncoding(#[from] std::string::FromUtf8Error),

    /// The PKCS#12 bundle could not be decoded with the fetched password
    #[error("decode cert content: {0}")]
    Decode(String),

    /// The trusting HTTP client could not be built
    #[error("build trusting client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The configured image reference is unusable
    #[error("lowkey vault image: {0}")]
    Image(#[from] ImageError),

    /// The container could not be started or stopped
    #[error("lowkey vault container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
}

impl VaultError {
    /// True when a metadata endpoint did not serve its content
    pub fn is_content_not_found(&self) -> bool {
        matches!(self, Self::ContentNotFound { .. })
    }

    /// True when the trust material could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
