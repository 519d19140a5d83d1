//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::error::{Error, Result};
use crate::webhooks::tls;

/// Default HTTPS listen port
pub const DEFAULT_PORT: u16 = 443;
/// Default health/metrics listen port
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Namespace deletion guard admission webhook
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(name = "namespace-guard", version, about)]
pub struct GuardConfig {
    /// HTTPS listen port
    #[arg(long, env = "NAMESPACE_GUARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Server certificate (PEM)
    #[arg(
        long,
        env = "NAMESPACE_GUARD_CERT_FILE",
        default_value = "/var/lib/kubernetes/kubernetes.pem"
    )]
    pub cert_file: PathBuf,

    /// Server private key (PEM)
    #[arg(
        long,
        env = "NAMESPACE_GUARD_KEY_FILE",
        default_value = "/var/lib/kubernetes/kubernetes-key.pem"
    )]
    pub key_file: PathBuf,

    /// Cluster root CA that signs the API server client certificate
    #[arg(
        long,
        env = "NAMESPACE_GUARD_CLIENT_CA_FILE",
        default_value = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt"
    )]
    pub client_ca_file: PathBuf,

    /// Require and verify client certificates during the TLS handshake
    #[arg(long, env = "NAMESPACE_GUARD_CLIENT_AUTH")]
    pub client_auth: bool,

    /// Admit all namespace deletions without validation
    #[arg(long, env = "NAMESPACE_GUARD_ADMIT_ALL")]
    pub admit_all: bool,

    /// Path to a kubeconfig file; when unset the in-cluster or default config is inferred
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Health and metrics listen port
    #[arg(long, env = "NAMESPACE_GUARD_HEALTH_PORT", default_value_t = DEFAULT_HEALTH_PORT)]
    pub health_port: u16,
}

impl GuardConfig {
    /// Build the Kubernetes client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the kubeconfig cannot be read or no
    /// configuration can be inferred.
    pub async fn kube_config(&self) -> Result<Config> {
        match &self.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::Config(format!("Failed to read kubeconfig {}: {}", path.display(), e))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::Config(format!("Invalid kubeconfig {}: {}", path.display(), e)))
            }
            None => Config::infer()
                .await
                .map_err(|e| Error::Config(format!("Failed to infer kube config: {}", e))),
        }
    }

    /// Create the shared Kubernetes client.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be built or the client
    /// cannot be constructed from it.
    pub async fn kube_client(&self) -> Result<Client> {
        tls::install_crypto_provider()?;
        let config = self.kube_config().await?;
        Ok(Client::try_from(config)?)
    }
}
