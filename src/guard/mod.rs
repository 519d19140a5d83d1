//! Namespace deletion decision engine.
//!
//! One review is evaluated in order, terminating at the first applicable
//! branch:
//! 1. Admit-all override
//! 2. Resource-type gate (only core/v1 `namespaces`)
//! 3. Operation gate (only DELETE)
//! 4. Namespace lookup (not-found defers to the API server, other errors deny)
//! 5. Bypass annotation
//! 6. Resource census folded into the verdict
//!
//! Every failure path ends in a verdict; `decide` never returns an error.

pub mod census;
pub mod request;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use tracing::debug;

pub use census::{
    CensusResult, KindCount, KindFailure, MONITORED_KINDS, ResourceCounter, ResourceKindQuery,
    census,
};
pub use request::{ResourceType, ReviewOperation, ReviewRequest};

use crate::error::Result;
use crate::health::HealthState;

/// Annotation that disables the policy for one namespace when set to `"true"`
pub const BYPASS_ANNOTATION_KEY: &str =
    "k8s-namespace-guard.admission.yahoo.com/allow-cascade-delete";

/// Resolves a namespace object by name
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    /// Fetch the namespace called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for which [`crate::Error::is_not_found`] holds when the
    /// namespace does not exist, and any other error when it cannot be read.
    async fn get_namespace(&self, name: &str) -> Result<Namespace>;
}

/// Which decision branch produced a verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    AdmitAll,
    UnexpectedResource,
    UnsupportedOperation,
    NamespaceNotFound,
    LookupFailed,
    Bypassed,
    Empty,
    Blocked,
    MalformedReview,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::AdmitAll => "AdmitAll",
            Outcome::UnexpectedResource => "UnexpectedResource",
            Outcome::UnsupportedOperation => "UnsupportedOperation",
            Outcome::NamespaceNotFound => "NamespaceNotFound",
            Outcome::LookupFailed => "LookupFailed",
            Outcome::Bypassed => "Bypassed",
            Outcome::Empty => "Empty",
            Outcome::Blocked => "Blocked",
            Outcome::MalformedReview => "MalformedReview",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one decision
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewVerdict {
    /// Whether the deletion may proceed
    pub allowed: bool,
    /// Explanation; non-empty for every denial
    pub reason: String,
    /// Branch that produced the verdict
    pub outcome: Outcome,
}

impl ReviewVerdict {
    /// Create an allowed verdict
    pub fn allow(outcome: Outcome) -> Self {
        Self {
            allowed: true,
            reason: String::new(),
            outcome,
        }
    }

    /// Create a denied verdict
    pub fn deny(outcome: Outcome, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            outcome,
        }
    }
}

/// True when the annotations carry the bypass marker with value exactly `"true"`
pub fn has_bypass_annotation(annotations: Option<&BTreeMap<String, String>>) -> bool {
    annotations
        .and_then(|a| a.get(BYPASS_ANNOTATION_KEY))
        .is_some_and(|value| value == "true")
}

/// Instruction appended to every census denial
pub fn bypass_instructions(namespace: &str) -> String {
    format!(
        "WARNING: If you know what you are doing, run `kubectl annotate namespace {} {}=true` to bypass this policy check.",
        namespace, BYPASS_ANNOTATION_KEY
    )
}

/// Render the denial reason for a census, or `None` when the namespace is clean.
///
/// Clause order is fixed: live resources, then query errors, then the
/// bypass instruction.
pub fn census_denial_reason(namespace: &str, result: &CensusResult) -> Option<String> {
    if result.is_clean() {
        return None;
    }

    let mut clauses = Vec::with_capacity(3);
    if !result.non_empty_kinds.is_empty() {
        let kinds: Vec<String> = result.non_empty_kinds.iter().map(|k| k.to_string()).collect();
        clauses.push(format!(
            "The namespace {} you are trying to remove contains one or more of these resources: [{}]. Please delete them and try again.",
            namespace,
            kinds.join(" ")
        ));
    }
    if !result.failed_kinds.is_empty() {
        let errors: Vec<String> = result.failed_kinds.iter().map(|f| f.to_string()).collect();
        clauses.push(format!(
            "The following error(s) occurred while validating the DELETE operation on the namespace {}: [{}].",
            namespace,
            errors.join(" ")
        ));
    }
    clauses.push(bypass_instructions(namespace));
    Some(clauses.join(" "))
}

/// Admission policy for namespace deletion
#[derive(Clone)]
pub struct NamespaceGuard {
    /// Allow every request without evaluation
    admit_all: bool,
    /// Namespace lookup capability
    lookup: Arc<dyn NamespaceLookup>,
    /// Monitored kinds, in reporting order
    kinds: Vec<ResourceKindQuery>,
    /// Optional health state for census metrics
    health_state: Option<Arc<HealthState>>,
}

impl NamespaceGuard {
    /// Create a guard over the given capabilities
    pub fn new(lookup: Arc<dyn NamespaceLookup>, kinds: Vec<ResourceKindQuery>) -> Self {
        Self {
            admit_all: false,
            lookup,
            kinds,
            health_state: None,
        }
    }

    /// Record census metrics into `health_state`
    pub fn with_health_state(mut self, health_state: Option<Arc<HealthState>>) -> Self {
        self.health_state = health_state;
        self
    }

    /// Enable or disable the admit-all override
    pub fn with_admit_all(mut self, admit_all: bool) -> Self {
        self.admit_all = admit_all;
        self
    }

    /// Decide one admission review
    pub async fn decide(&self, request: &ReviewRequest) -> ReviewVerdict {
        if self.admit_all {
            return ReviewVerdict::allow(Outcome::AdmitAll);
        }

        if !request.resource.is_namespace() {
            return ReviewVerdict::deny(
                Outcome::UnexpectedResource,
                format!("Incoming resource is not a Namespace: {}", request.resource),
            );
        }

        if request.operation != ReviewOperation::Delete {
            return ReviewVerdict::deny(
                Outcome::UnsupportedOperation,
                format!(
                    "Incoming operation is {} on namespace {}. Only DELETE is currently supported.",
                    request.operation, request.name
                ),
            );
        }

        let namespace = match self.lookup.get_namespace(&request.name).await {
            Ok(ns) => ns,
            Err(e) if e.is_not_found() => {
                debug!(namespace = %request.name, error = %e, "Namespace not found, deferring to API server");
                return ReviewVerdict::allow(Outcome::NamespaceNotFound);
            }
            Err(e) => {
                return ReviewVerdict::deny(
                    Outcome::LookupFailed,
                    format!(
                        "Error occurred while retrieving the namespace {}: {}",
                        request.name, e
                    ),
                );
            }
        };

        if has_bypass_annotation(namespace.metadata.annotations.as_ref()) {
            return ReviewVerdict::allow(Outcome::Bypassed);
        }

        let result = census(&request.name, &self.kinds).await;
        if let Some(state) = &self.health_state {
            state.metrics.record_census(&result);
        }
        match census_denial_reason(&request.name, &result) {
            Some(reason) => ReviewVerdict::deny(Outcome::Blocked, reason),
            None => ReviewVerdict::allow(Outcome::Empty),
        }
    }
}
