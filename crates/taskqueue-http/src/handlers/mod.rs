pub mod client;
pub mod worker;

use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// `{"error":{"type":"bad_id"}}`, HTTP 200 — worker endpoints never 404 on
/// an unknown id, to distinguish it from a transient network failure.
pub(crate) fn bad_id_response() -> Json<serde_json::Value> {
    Json(json!({"error": {"type": "bad_id"}}))
}

/// Bare HTTP 404 for an unknown (and never-confirmed) confirmation code.
pub(crate) fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": {"type": "not_found"}})))
}
