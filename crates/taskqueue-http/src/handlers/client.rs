//! Front-end-facing endpoints: submit, confirm, and worker-liveness probe.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use taskqueue_core::ConfirmOutcome;

use crate::AppState;

/// `task_json` arrives as a form field on `POST /client_model_create`.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    task_json: String,
}

/// `POST /client_model_create`.
pub async fn create(State(broker): State<AppState>, Form(form): Form<SubmitForm>) -> impl IntoResponse {
    let raw: serde_json::Value = match serde_json::from_str(&form.task_json) {
        Ok(value) => value,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"type": "invalid_json", "message": err.to_string()}})),
            )
                .into_response();
        }
    };

    match broker.submit(&raw) {
        Ok((task, code)) => Json(json!({"response": {"task": task, "code": code}})).into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"type": "validation_failure", "message": err.to_string()}})),
        )
            .into_response(),
    }
}

/// `GET /client_queue_has_workers`.
pub async fn has_workers(State(broker): State<AppState>) -> impl IntoResponse {
    Json(json!({"response": {"has_workers": broker.has_workers()}}))
}

/// `GET /client_confirm/{code}`.
pub async fn confirm(State(broker): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    match broker.confirm(&code) {
        ConfirmOutcome::Confirmed => Json(json!({"response": "okay"})).into_response(),
        ConfirmOutcome::AlreadyConfirmed => Json(json!({"response": "already_confirmed"})).into_response(),
        ConfirmOutcome::NotFound => super::not_found().into_response(),
    }
}
