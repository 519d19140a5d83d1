//! namespace-guard library crate
//!
//! Validating admission webhook that refuses deletion of namespaces still
//! holding workload resources, unless the namespace carries the bypass
//! annotation. This module exports the decision engine, the kube-backed
//! cluster access, and the webhook and health servers.

pub mod cluster;
pub mod config;
pub mod error;
pub mod guard;
pub mod health;
pub mod webhooks;

pub use config::GuardConfig;
pub use error::{Error, Result};
pub use guard::{
    BYPASS_ANNOTATION_KEY, NamespaceGuard, NamespaceLookup, Outcome, ResourceCounter,
    ResourceKindQuery, ReviewRequest, ReviewVerdict,
};
pub use health::HealthState;
pub use webhooks::run_webhook_server;

use std::sync::Arc;

use kube::Client;

use cluster::{KubeNamespaceLookup, monitored_kinds};

/// Build the guard over a live cluster client
pub fn kube_guard(client: Client, admit_all: bool) -> NamespaceGuard {
    let kinds = monitored_kinds(&client);
    NamespaceGuard::new(Arc::new(KubeNamespaceLookup::new(client)), kinds)
        .with_admit_all(admit_all)
}
