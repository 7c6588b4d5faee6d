//! Worker-facing endpoints: check-in, poll, heartbeat, has-task, succeed, fail.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use taskqueue_core::PollOutcome;

use crate::AppState;

/// `GET /worker_info`: touch the worker check-in clock.
pub async fn info(State(broker): State<AppState>) -> impl IntoResponse {
    broker.touch_worker_checkin();
    Json(json!({}))
}

/// `GET /worker_work_task`.
pub async fn work_task(State(broker): State<AppState>) -> impl IntoResponse {
    match broker.poll() {
        PollOutcome::Task(task) => Json(json!({"task": task.encode()})),
        PollOutcome::EmptyQueue => Json(json!({"status": "empty_queue"})),
    }
}

/// `GET /worker_keep_alive_task/{id}`.
pub async fn keep_alive(State(broker): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match broker.heartbeat(id) {
        Ok(()) => Json(json!({})),
        Err(_) => super::bad_id_response(),
    }
}

/// `GET /worker_has_task/{id}`.
pub async fn has_task(State(broker): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    let response = if broker.has_task(id) { "yes" } else { "no" };
    Json(json!({"response": response}))
}

/// `GET /worker_succeed_task/{id}`.
pub async fn succeed_task(State(broker): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match broker.succeed(id) {
        Ok(()) => Json(json!({"status": "okay"})),
        Err(_) => super::bad_id_response(),
    }
}

/// `GET /worker_failed_task/{id}`.
pub async fn failed_task(State(broker): State<AppState>, Path(id): Path<u64>) -> impl IntoResponse {
    match broker.fail(id) {
        Ok(()) => Json(json!({"status": "okay"})),
        Err(_) => super::bad_id_response(),
    }
}
