//! Decisions through the HTTP admission envelope.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use namespace_guard::HealthState;
use namespace_guard::webhooks::{WebhookState, create_webhook_router};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{MockCluster, admission_review};

fn router(cluster: &Arc<MockCluster>, health: Option<Arc<HealthState>>) -> Router {
    let guard = cluster.guard().with_health_state(health.clone());
    create_webhook_router(Arc::new(WebhookState::new(guard, health)))
}

async fn send(router: Router, body: String) -> Value {
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_denial_envelope_carries_reason() {
    let cluster = Arc::new(
        MockCluster::new()
            .namespace("ns3")
            .with_count("ns3", "pods", 2)
            .with_count("ns3", "services", 1),
    );

    let body = send(
        router(&cluster, None),
        admission_review("namespaces", "DELETE", "ns3").to_string(),
    )
    .await;

    assert_eq!(body["apiVersion"], json!("admission.k8s.io/v1"));
    assert_eq!(body["kind"], json!("AdmissionReview"));
    let response = &body["response"];
    assert_eq!(response["uid"], json!("7f0b2891-916f-4ed6-b7cd-27bff1815a8c"));
    assert_eq!(response["allowed"], json!(false));
    let message = response["status"]["message"].as_str().unwrap();
    assert!(message.contains("[pods(2) services(1)]"));
    assert!(message.contains("kubectl annotate namespace ns3"));
}

#[tokio::test]
async fn test_bypass_through_envelope() {
    let cluster = Arc::new(
        MockCluster::new()
            .bypassed_namespace("ns1", "true")
            .with_count("ns1", "pods", 3),
    );

    let body = send(
        router(&cluster, None),
        admission_review("namespaces", "DELETE", "ns1").to_string(),
    )
    .await;

    assert_eq!(body["response"]["allowed"], json!(true));
    assert_eq!(cluster.count_queries(), 0);
}

#[tokio::test]
async fn test_create_through_envelope_is_denied() {
    let cluster = Arc::new(MockCluster::new().namespace("fresh"));

    let body = send(
        router(&cluster, None),
        admission_review("namespaces", "CREATE", "fresh").to_string(),
    )
    .await;

    assert_eq!(body["response"]["allowed"], json!(false));
    let message = body["response"]["status"]["message"].as_str().unwrap();
    assert_eq!(
        message,
        "Incoming operation is CREATE on namespace fresh. Only DELETE is currently supported."
    );
}

#[tokio::test]
async fn test_metrics_follow_answered_reviews() {
    let health = Arc::new(HealthState::new());
    let cluster = Arc::new(
        MockCluster::new()
            .namespace("ns5")
            .with_failure("ns5", "ingresses", "timeout"),
    );
    let router = router(&cluster, Some(health.clone()));

    send(
        router.clone(),
        admission_review("namespaces", "DELETE", "ns5").to_string(),
    )
    .await;
    send(router, "[]".to_string()).await;

    let metrics = health.metrics.encode();
    assert!(metrics.contains("outcome=\"Blocked\""));
    assert!(metrics.contains("outcome=\"MalformedReview\""));
    assert!(metrics.contains("namespace_guard_census_query_errors_total{kind=\"ingresses\"} 1"));
}
