//! Webhook module for namespace deletion admission reviews.
//!
//! This module provides the HTTPS transport around the decision engine:
//! envelope decoding, response encoding, verdict logging and TLS setup.

mod server;
pub mod tls;

pub use server::{WebhookState, create_webhook_router, review, run_webhook_server};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
