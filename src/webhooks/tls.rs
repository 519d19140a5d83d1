//! TLS configuration for the webhook listener.
//!
//! Certificates are read from PEM files. When a client CA is supplied, client
//! certificates are required and verified against it during the handshake.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::crypto::{CryptoProvider, aws_lc_rs};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

use crate::error::{Error, Result};

/// Install aws-lc-rs as the process-level rustls provider.
///
/// The kube client builds its TLS configuration from the process default,
/// so this must run before any client is created. Safe to call repeatedly.
///
/// # Errors
///
/// Returns [`Error::TlsConfig`] when no process-level provider is available
/// after the install attempt.
pub fn install_crypto_provider() -> Result<()> {
    if CryptoProvider::get_default().is_some() {
        return Ok(());
    }
    match aws_lc_rs::default_provider().install_default() {
        Ok(()) => Ok(()),
        // Lost a race with another installer
        Err(_) if CryptoProvider::get_default().is_some() => Ok(()),
        Err(_) => Err(Error::TlsConfig(
            "Failed to install the process-level crypto provider".to_string(),
        )),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| Error::TlsConfig(format!("Couldn't open {}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

/// Read every certificate in a PEM file
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            Error::TlsConfig(format!("Failed to parse certificate {}: {}", path.display(), e))
        })?;
    if certs.is_empty() {
        return Err(Error::TlsConfig(format!(
            "No certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Read the first private key in a PEM file
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|e| Error::TlsConfig(format!("Failed to parse key {}: {}", path.display(), e)))?
        .ok_or_else(|| Error::TlsConfig(format!("No private key found in {}", path.display())))
}

/// Build the rustls server configuration.
///
/// # Errors
///
/// Returns [`Error::TlsConfig`] when a file cannot be read or parsed, or the
/// key does not match the certificate.
pub fn server_config(
    cert_path: &Path,
    key_path: &Path,
    client_ca_path: Option<&Path>,
) -> Result<ServerConfig> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = Arc::new(aws_lc_rs::default_provider());
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsConfig(format!("Unsupported protocol versions: {}", e)))?;

    let mut config = match client_ca_path {
        Some(ca_path) => {
            let mut roots = RootCertStore::empty();
            for cert in load_certs(ca_path)? {
                roots
                    .add(cert)
                    .map_err(|e| Error::TlsConfig(format!("Failed to add CA certificate: {}", e)))?;
            }
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .map_err(|e| Error::TlsConfig(format!("Failed to build client verifier: {}", e)))?;
            builder
                .with_client_cert_verifier(verifier)
                .with_single_cert(certs, key)
        }
        None => builder.with_no_client_auth().with_single_cert(certs, key),
    }
    .map_err(|e| Error::TlsConfig(format!("Failed to build TLS config: {}", e)))?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}
