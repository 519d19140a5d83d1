//! Shared test cluster singleton.
//!
//! Validates connectivity once for all integration tests. Each test creates
//! its own Client from the shared cluster.

use kube::{Client, Config};
use namespace_guard::webhooks::tls::install_crypto_provider;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::OnceCell;

static SHARED_CLUSTER: OnceCell<Arc<SharedTestCluster>> = OnceCell::const_new();

/// Shared test cluster providing Kubernetes connectivity.
pub struct SharedTestCluster {
    _marker: (),
}

impl SharedTestCluster {
    /// Get or create the shared test cluster.
    ///
    /// Safe to call from multiple tests concurrently. The first call validates
    /// connectivity, subsequent calls return the cached instance.
    pub async fn get() -> Arc<SharedTestCluster> {
        SHARED_CLUSTER
            .get_or_init(|| async {
                let cluster = Self::connect().await.expect(
                    "Failed to connect to Kubernetes cluster. Is your kubeconfig configured?",
                );
                Arc::new(cluster)
            })
            .await
            .clone()
    }

    /// Create a new Kubernetes client.
    pub async fn new_client(&self) -> Client {
        install_crypto_provider().expect("Failed to install crypto provider");
        let config = Config::infer().await.expect("Failed to infer kube config");
        Client::try_from(config).expect("Failed to create kube client")
    }

    async fn connect() -> Result<Self, kube::Error> {
        install_crypto_provider().expect("Failed to install crypto provider");
        let config = Config::infer()
            .await
            .map_err(|e| kube::Error::Service(std::io::Error::other(e.to_string()).into()))?;
        let client = Client::try_from(config)?;

        let version = client.apiserver_version().await?;
        tracing::info!(
            "Connected to Kubernetes cluster: {} {}",
            version.platform,
            version.git_version
        );

        Ok(Self { _marker: () })
    }
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing for tests (optional, call once).
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}
