//! Trust bootstrap for the Lowkey Vault HTTPS API
//!
//! Lowkey Vault serves its API over HTTPS with a self-issued default
//! certificate, and publishes that certificate (as PKCS#12) and its password
//! on the plain HTTP metadata port. This module fetches both, decodes the
//! certificate and builds a client that trusts only that certificate.
//!
//! The metadata fetch is unauthenticated. That is acceptable for ephemeral
//! test containers only; do not reuse this against anything long-lived.
//!
//! # Steps
//!
//! 1. Resolve the metadata authority from the test runner ([`AccessMode::Local`])
//! 2. `GET /metadata/default-cert/password`
//! 3. `GET /metadata/default-cert/lowkey-vault.p12`
//! 4. Decode the bundle, expecting exactly one certificate
//! 5. Build a client with built-in roots disabled and that certificate as the only root
//!
//! There are no retries; the first failure is returned.

use tc_modules_core::{AccessMode, ContainerHandle, HostResolver};
use tracing::debug;

use crate::error::VaultError;
use crate::METADATA_PORT;

/// Metadata path serving the default certificate's password
pub const DEFAULT_CERT_PASSWORD_PATH: &str = "/metadata/default-cert/password";

/// Metadata path serving the default certificate as PKCS#12
pub const DEFAULT_CERT_PATH: &str = "/metadata/default-cert/lowkey-vault.p12";

/// Build an HTTP client that trusts the container's default certificate
pub async fn trusting_client<H: ContainerHandle>(
    resolver: &HostResolver<H>,
) -> Result<reqwest::Client, VaultError> {
    tc_modules_core::init_crypto_provider();

    let authority = resolver.authority(METADATA_PORT, AccessMode::Local).await?;
    let fetcher = metadata_client()?;

    let password = fetch_default_cert_password(&fetcher, &authority).await?;
    let bundle = fetch_default_cert(&fetcher, &authority).await?;
    let certificate = decode_certificate(&bundle, &password)?;

    build_client(&certificate)
}

async fn fetch_default_cert_password(
    client: &reqwest::Client,
    authority: &str,
) -> Result<String, VaultError> {
    let url = format!("http://{}{}", authority, DEFAULT_CERT_PASSWORD_PATH);
    let bytes = fetch_content(client, &url).await?;
    Ok(String::from_utf8(bytes)?)
}

async fn fetch_default_cert(
    client: &reqwest::Client,
    authority: &str,
) -> Result<Vec<u8>, VaultError> {
    fetch_content(client, &format!("http://{}{}", authority, DEFAULT_CERT_PATH)).await
}

async fn fetch_content(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, VaultError> {
    debug!(url = %url, "Fetching metadata content");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| VaultError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(VaultError::ContentNotFound {
            url: url.to_string(),
            status: status.as_u16(),
            source: None,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| VaultError::ContentNotFound {
            url: url.to_string(),
            status: status.as_u16(),
            source: Some(source),
        })?;

    Ok(body.to_vec())
}

/// Decode a PKCS#12 bundle holding exactly one certificate, returning its DER
///
/// # Errors
///
/// Returns [`VaultError::Decode`] for malformed bundles, a password that does
/// not match the bundle's integrity check, or a bundle with zero or several
/// certificates.
pub fn decode_certificate(bundle: &[u8], password: &str) -> Result<Vec<u8>, VaultError> {
    let pfx = p12::PFX::parse(bundle)
        .map_err(|e| VaultError::Decode(format!("malformed PKCS#12 bundle: {:?}", e)))?;

    if !pfx.verify_mac(password) {
        return Err(VaultError::Decode(
            "integrity check failed, the password does not match the bundle".to_string(),
        ));
    }

    let mut certificates = pfx
        .cert_x509_bags(password)
        .map_err(|e| VaultError::Decode(format!("unreadable certificate bags: {:?}", e)))?;

    match certificates.len() {
        1 => Ok(certificates.remove(0)),
        count => Err(VaultError::Decode(format!(
            "expected exactly one certificate, found {}",
            count
        ))),
    }
}

/// Plain HTTP client for the metadata port
fn metadata_client() -> Result<reqwest::Client, VaultError> {
    reqwest::Client::builder()
        .build()
        .map_err(VaultError::ClientBuild)
}

fn build_client(certificate_der: &[u8]) -> Result<reqwest::Client, VaultError> {
    let certificate =
        reqwest::Certificate::from_der(certificate_der).map_err(VaultError::ClientBuild)?;

    reqwest::Client::builder()
        .use_rustls_tls()
        .tls_built_in_root_certs(false)
        .add_root_certificate(certificate)
        .build()
        .map_err(VaultError::ClientBuild)
}
