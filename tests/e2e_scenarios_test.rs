//! The six literal end-to-end scenarios, driving the axum router directly
//! with `tower::ServiceExt::oneshot` and short configured durations instead
//! of production-length timeouts.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use taskqueue_core::Broker;
use taskqueue_shared::config::BrokerConfig;
use taskqueue_shared::mail::LoggingMailGateway;
use taskqueue_shared::registry::{DefaultRegistry, ModelDefinition};
use taskqueue_shared::templates::{EmailTemplateSource, TemplateRenderer};
use tower::ServiceExt;

fn broker(config: BrokerConfig) -> Arc<Broker> {
    let renderer = Arc::new(TemplateRenderer::compile(&EmailTemplateSource::default()).unwrap());
    let registry = Arc::new(DefaultRegistry::new(vec![ModelDefinition::new("m", 1, vec![])], Arc::clone(&renderer)));
    let mail = Arc::new(LoggingMailGateway::spawn());
    Arc::new(Broker::new(config, registry, mail, renderer))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn submit_request() -> Request<Body> {
    let task_json = json!({
        "modelName": "m",
        "modelVersion": 1,
        "emailAddress": "user@example.com",
        "params": [],
    })
    .to_string();
    Request::builder()
        .method("POST")
        .uri("/client_model_create")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("task_json={}", urlencode(&task_json))))
        .unwrap()
}

fn get(uri: impl Into<String>) -> Request<Body> {
    Request::builder().uri(uri.into()).body(Body::empty()).unwrap()
}

/// Scenario: happy path (submit -> confirm -> poll -> succeed).
#[tokio::test]
async fn happy_path() {
    let broker = broker(BrokerConfig::default());
    let app = taskqueue_http::router(Arc::clone(&broker));

    let response = app.clone().oneshot(submit_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let code = body_json(response).await["response"]["code"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();
    assert_eq!(body_json(response).await["response"], "okay");

    let response = app.clone().oneshot(get("/worker_work_task")).await.unwrap();
    let worker_response = body_json(response).await;
    let task_id = worker_response["task"]["taskId"].as_u64().unwrap();
    assert_eq!(worker_response["task"]["failureCount"], 0);

    let response = app.oneshot(get(format!("/worker_succeed_task/{task_id}"))).await.unwrap();
    assert_eq!(body_json(response).await["status"], "okay");
}

/// Scenario: confirmation expiry (an unconfirmed submission is swept away).
#[tokio::test]
async fn confirmation_expiry() {
    let config = BrokerConfig { confirm_timeout_secs: 0, ..BrokerConfig::default() };
    let broker = broker(config);
    let app = taskqueue_http::router(Arc::clone(&broker));

    let response = app.clone().oneshot(submit_request()).await.unwrap();
    let code = body_json(response).await["response"]["code"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(10)).await;

    let response = app.oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Scenario: worker death and recycle (a stale processing task comes back
/// to the ready queue under a fresh id).
#[tokio::test]
async fn worker_death_and_recycle() {
    let config = BrokerConfig {
        keep_alive_interval_secs: 0,
        keep_alive_timeout_secs: 0,
        max_job_failures: 3,
        ..BrokerConfig::default()
    };
    let broker = broker(config);
    let app = taskqueue_http::router(Arc::clone(&broker));
    let expiry_loop = taskqueue_core::expiry_loop::spawn(Arc::clone(&broker));

    let response = app.clone().oneshot(submit_request()).await.unwrap();
    let code = body_json(response).await["response"]["code"].as_str().unwrap().to_string();
    let _ = app.clone().oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();

    let response = app.clone().oneshot(get("/worker_work_task")).await.unwrap();
    let old_id = body_json(response).await["task"]["taskId"].as_u64().unwrap();

    // Worker never heartbeats or finishes; the expiry loop reclaims it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = app.clone().oneshot(get(format!("/worker_has_task/{old_id}"))).await.unwrap();
    assert_eq!(body_json(response).await["response"], "no");

    let response = app.oneshot(get("/worker_work_task")).await.unwrap();
    let new_id = body_json(response).await["task"]["taskId"].as_u64().unwrap();
    assert_ne!(old_id, new_id);

    expiry_loop.stop().await;
}

/// Scenario: exhausted retries (a worker-reported failure past the budget
/// sends a failure notice instead of recycling).
#[tokio::test]
async fn exhausted_retries() {
    let config = BrokerConfig { max_job_failures: 1, ..BrokerConfig::default() };
    let broker = broker(config);
    let app = taskqueue_http::router(Arc::clone(&broker));

    let response = app.clone().oneshot(submit_request()).await.unwrap();
    let code = body_json(response).await["response"]["code"].as_str().unwrap().to_string();
    let _ = app.clone().oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();

    let response = app.clone().oneshot(get("/worker_work_task")).await.unwrap();
    let task_id = body_json(response).await["task"]["taskId"].as_u64().unwrap();

    let response = app.clone().oneshot(get(format!("/worker_failed_task/{task_id}"))).await.unwrap();
    assert_eq!(body_json(response).await["status"], "okay");

    // Budget exhausted: nothing comes back to the ready queue.
    let response = app.oneshot(get("/worker_work_task")).await.unwrap();
    assert_eq!(body_json(response).await["status"], "empty_queue");
}

/// Scenario: double-confirm is idempotent.
#[tokio::test]
async fn double_confirm() {
    let broker = broker(BrokerConfig::default());
    let app = taskqueue_http::router(Arc::clone(&broker));

    let response = app.clone().oneshot(submit_request()).await.unwrap();
    let code = body_json(response).await["response"]["code"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();
    assert_eq!(body_json(response).await["response"], "okay");

    let response = app.oneshot(get(format!("/client_confirm/{code}"))).await.unwrap();
    assert_eq!(body_json(response).await["response"], "already_confirmed");
}

/// Scenario: no workers (the front-end's liveness probe before any worker
/// has ever checked in).
#[tokio::test]
async fn no_workers() {
    let broker = broker(BrokerConfig::default());
    let app = taskqueue_http::router(broker);

    let response = app.oneshot(get("/client_queue_has_workers")).await.unwrap();
    assert_eq!(body_json(response).await["response"]["has_workers"], false);
}
