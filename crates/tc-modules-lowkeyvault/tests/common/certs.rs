//! Certificate generation for trust bootstrap tests
//!
//! Generates self-signed server certificates at runtime using rcgen, shaped
//! like the default certificate Lowkey Vault serves, and packs them into
//! password-protected PKCS#12 bundles.

use rcgen::{CertificateParams, DnType, KeyPair, SanType};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

/// A self-signed certificate and its key (DER format)
#[derive(Debug, Clone)]
pub struct TestCertificate {
    pub cert_der: Vec<u8>,
    pub key_der: Vec<u8>,
}

impl TestCertificate {
    /// Generate a certificate valid for `localhost` and `127.0.0.1`
    pub fn generate(common_name: &str) -> Self {
        Self::generate_with_validity(common_name, Duration::from_secs(3600)) // 1 hour
    }

    /// Generate a certificate with a specific validity period
    pub fn generate_with_validity(common_name: &str, validity: Duration) -> Self {
        let key = KeyPair::generate().expect("Failed to generate key");
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, common_name);
        params
            .distinguished_name
            .push(DnType::OrganizationName, "tc-modules");
        params.subject_alt_names = vec![
            SanType::DnsName("localhost".try_into().expect("Invalid DNS name")),
            SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ];
        params.not_before = time::OffsetDateTime::now_utc();
        params.not_after = time::OffsetDateTime::now_utc() + validity;
        let cert = params
            .self_signed(&key)
            .expect("Failed to generate self-signed cert");

        Self {
            cert_der: cert.der().to_vec(),
            key_der: key.serialize_der(),
        }
    }

    /// Pack the certificate and key into a PKCS#12 bundle
    pub fn to_pkcs12(&self, password: &str) -> Vec<u8> {
        p12::PFX::new(&self.cert_der, &self.key_der, None, password, "lowkey-vault")
            .expect("Failed to build PKCS#12 bundle")
            .to_der()
    }

    /// rustls server configuration presenting this certificate
    pub fn server_config(&self) -> Arc<rustls::ServerConfig> {
        tc_modules_core::init_crypto_provider();

        let cert_chain = vec![CertificateDer::from(self.cert_der.clone())];
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key_der.clone()));
        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(cert_chain, key)
            .expect("Failed to build server config");
        Arc::new(config)
    }
}
