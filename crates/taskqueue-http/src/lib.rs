//! # taskqueue-http
//!
//! The nine-endpoint HTTP surface over [`taskqueue_core::Broker`].
//! Every handler is a thin, stateless wrapper: all the business logic lives
//! on `Broker` itself so it can be unit-tested without standing up a server.

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use taskqueue_core::Broker;
use tower_http::trace::TraceLayer;

/// Shared application state handed to every handler via `State`.
pub type AppState = Arc<Broker>;

/// Build the router. Does not bind a socket; callers pass this to
/// `axum::serve` or, in tests, drive it directly with `tower::ServiceExt`.
pub fn router(broker: AppState) -> Router {
    Router::new()
        .route("/client_model_create", post(handlers::client::create))
        .route("/client_queue_has_workers", get(handlers::client::has_workers))
        .route("/client_confirm/{code}", get(handlers::client::confirm))
        .route("/worker_info", get(handlers::worker::info))
        .route("/worker_work_task", get(handlers::worker::work_task))
        .route("/worker_keep_alive_task/{id}", get(handlers::worker::keep_alive))
        .route("/worker_has_task/{id}", get(handlers::worker::has_task))
        .route("/worker_succeed_task/{id}", get(handlers::worker::succeed_task))
        .route("/worker_failed_task/{id}", get(handlers::worker::failed_task))
        .layer(TraceLayer::new_for_http())
        .with_state(broker)
}
