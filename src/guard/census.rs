//! Resource census over the monitored workload kinds of one namespace.
//!
//! Every query runs, regardless of earlier failures or non-zero counts, so
//! that one denial can enumerate all blocking resources at once. Queries are
//! fanned out concurrently; results are folded in declaration order.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use crate::error::Result;

/// Monitored workload kinds, in the order they appear in denial reasons
pub const MONITORED_KINDS: [&str; 8] = [
    "pods",
    "services",
    "replicasets",
    "deployments",
    "statefulsets",
    "daemonsets",
    "ingresses",
    "horizontalpodautoscalers",
];

/// Counts live objects of one kind in a namespace
#[async_trait]
pub trait ResourceCounter: Send + Sync {
    /// Number of live objects in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error when the cluster cannot be queried.
    async fn count(&self, namespace: &str) -> Result<usize>;
}

/// A kind label paired with the capability that counts it
#[derive(Clone)]
pub struct ResourceKindQuery {
    pub kind: &'static str,
    pub counter: Arc<dyn ResourceCounter>,
}

impl ResourceKindQuery {
    pub fn new(kind: &'static str, counter: Arc<dyn ResourceCounter>) -> Self {
        Self { kind, counter }
    }
}

impl fmt::Debug for ResourceKindQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKindQuery")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A kind with at least one live object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindCount {
    pub kind: &'static str,
    pub count: usize,
}

/// Formats as `pods(2)`.
impl fmt::Display for KindCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.count)
    }
}

/// A kind whose query could not complete
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindFailure {
    pub kind: &'static str,
    pub error: String,
}

/// Formats as `error listing ingresses, <error>`.
impl fmt::Display for KindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error listing {}, {}", self.kind, self.error)
    }
}

/// Folded outcome of running all queries against one namespace
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CensusResult {
    /// Kinds with a count above zero, in declaration order
    pub non_empty_kinds: Vec<KindCount>,
    /// Kinds whose query failed, in declaration order
    pub failed_kinds: Vec<KindFailure>,
}

impl CensusResult {
    /// True when nothing was found and nothing failed
    pub fn is_clean(&self) -> bool {
        self.non_empty_kinds.is_empty() && self.failed_kinds.is_empty()
    }
}

/// Run every query against `namespace`. Never fails as a whole.
pub async fn census(namespace: &str, kinds: &[ResourceKindQuery]) -> CensusResult {
    let results = join_all(kinds.iter().map(|query| async move {
        (query.kind, query.counter.count(namespace).await)
    }))
    .await;

    let mut result = CensusResult::default();
    for (kind, outcome) in results {
        match outcome {
            Ok(0) => {}
            Ok(count) => {
                debug!(namespace = %namespace, kind = kind, count = count, "Found live resources");
                result.non_empty_kinds.push(KindCount { kind, count });
            }
            Err(e) => {
                debug!(namespace = %namespace, kind = kind, error = %e, "Resource query failed");
                result.failed_kinds.push(KindFailure {
                    kind,
                    error: e.to_string(),
                });
            }
        }
    }
    result
}
