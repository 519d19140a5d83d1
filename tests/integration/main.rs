// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Integration tests for namespace-guard
//!
//! These tests require a running Kubernetes cluster accessible via kubeconfig.
//! Tests are marked with #[ignore] and must be run explicitly:
//!
//! ```bash
//! # Run all live-cluster tests
//! cargo test --test integration -- --ignored
//!
//! # Run specific test
//! cargo test --test integration test_namespace_with_service_is_blocked -- --ignored
//! ```
//!
//! The tests use your existing kubeconfig (~/.kube/config or KUBECONFIG env var).
//! The guard is driven in-process against the live API server, so no webhook
//! registration is needed.
//!
//! - **RAII Cleanup**: TestNamespace implements Drop for automatic cleanup even on panic
//! - **Isolation**: Each test gets its own uniquely named namespace

// Shared test fixtures (used by unit, integration, and proptest)
#[path = "../common/mod.rs"]
mod common;

mod cluster;
mod namespace;


pub use cluster::*;
pub use namespace::*;
