//! Admission webhook server.
//!
//! Provides HTTPS endpoints for the namespace deletion webhook:
//! - `POST /` - AdmissionReview for namespace DELETE operations
//! - `GET /status.html` - Always returns 200 `OK`
//!
//! Undecodable reviews are answered with a well-formed denial envelope so the
//! API server always receives an interpretable verdict.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tracing::{debug, info, warn};

use crate::config::GuardConfig;
use crate::error::{Error, Result};
use crate::guard::{NamespaceGuard, Outcome, ReviewRequest, ReviewVerdict};
use crate::health::HealthState;
use crate::webhooks::tls;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub guard: NamespaceGuard,
    /// Optional health state for metrics and readiness
    pub health_state: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(guard: NamespaceGuard, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            guard,
            health_state,
        }
    }

    fn record(&self, verdict: &ReviewVerdict, started: Instant) {
        if let Some(state) = &self.health_state {
            state
                .metrics
                .record_verdict(verdict, started.elapsed().as_secs_f64());
        }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", post(validate_namespace))
        .route("/status.html", get(status))
        .with_state(state)
}

async fn status() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn validate_namespace(
    State(state): State<Arc<WebhookState>>,
    body: Bytes,
) -> impl IntoResponse {
    (StatusCode::OK, Json(review(&state, &body).await))
}

/// Decode one review body, decide it, and build the response envelope
pub async fn review(state: &WebhookState, body: &[u8]) -> AdmissionReview<DynamicObject> {
    let started = Instant::now();

    let request = match decode(body) {
        Ok(request) => request,
        Err(message) => {
            let verdict = ReviewVerdict::deny(Outcome::MalformedReview, message);
            warn!(reason = %verdict.reason, "Rejecting undecodable admission review");
            state.record(&verdict, started);
            return AdmissionResponse::invalid(verdict.reason).into_review();
        }
    };

    let review_request = ReviewRequest::from(&request);
    debug!(
        uid = %review_request.uid,
        operation = %review_request.operation,
        resource = %review_request.resource,
        name = %review_request.name,
        "Incoming admission review"
    );

    let verdict = state.guard.decide(&review_request).await;
    log_verdict(&review_request, &verdict);
    state.record(&verdict, started);

    let response = AdmissionResponse::from(&request);
    if verdict.allowed {
        response.into_review()
    } else {
        response.deny(verdict.reason).into_review()
    }
}

fn decode(body: &[u8]) -> std::result::Result<AdmissionRequest<DynamicObject>, String> {
    let review: AdmissionReview<DynamicObject> = serde_json::from_slice(body).map_err(|e| {
        format!(
            "Failed to decode the request body json into an AdmissionReview resource: {}",
            e
        )
    })?;
    review.try_into().map_err(|e| {
        format!(
            "Failed to decode the request body json into an AdmissionReview resource: {}",
            e
        )
    })
}

fn log_verdict(request: &ReviewRequest, verdict: &ReviewVerdict) {
    match verdict.outcome {
        Outcome::AdmitAll => warn!(
            namespace = %request.name,
            "admit-all is enabled, allowing admission review without validation"
        ),
        Outcome::Bypassed => info!(
            namespace = %request.name,
            "Namespace has the bypass annotation set, OK to DELETE"
        ),
        Outcome::NamespaceNotFound => info!(
            namespace = %request.name,
            "Namespace not found, letting the API server handle the request"
        ),
        Outcome::Empty => info!(
            namespace = %request.name,
            "Namespace does not contain any workload resources, OK to DELETE"
        ),
        _ => {}
    }

    info!(
        uid = %request.uid,
        allowed = verdict.allowed,
        outcome = %verdict.outcome,
        operation = %request.operation,
        namespace = %request.name,
        user = %request.username,
        "Responding to admission review"
    );
    if !verdict.allowed {
        warn!(uid = %request.uid, reason = %verdict.reason, "Admission request denied");
    }
}

/// Run the webhook server with TLS
///
/// Binds to `0.0.0.0:{config.port}`. Readiness is reported once the TLS
/// configuration has loaded and the port is bound, and withdrawn if serving
/// stops with an error.
pub async fn run_webhook_server(
    guard: NamespaceGuard,
    config: &GuardConfig,
    health_state: Option<Arc<HealthState>>,
) -> Result<()> {
    let client_ca = config.client_auth.then_some(config.client_ca_file.as_path());
    let server_config = tls::server_config(&config.cert_file, &config.key_file, client_ca)?;
    let rustls_config = RustlsConfig::from_config(Arc::new(server_config));

    let state = Arc::new(WebhookState::new(guard, health_state.clone()));
    let app = create_webhook_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    let server = axum_server::from_tcp_rustls(listener, rustls_config)?;

    info!(
        port = config.port,
        client_auth = config.client_auth,
        "Webhook server listening with TLS"
    );
    if let Some(state) = &health_state {
        state.set_ready(true).await;
    }

    let served = server.serve(app.into_make_service()).await;
    if let Err(e) = served {
        if let Some(state) = &health_state {
            state.set_ready(false).await;
        }
        return Err(Error::Server(e.to_string()));
    }

    Ok(())
}
