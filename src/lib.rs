//! # Task Queue Broker
//!
//! Root crate for the workspace. Carries no logic of its own; it exists so the
//! top-level `tests/` directory can exercise the HTTP surface end to end
//! against the real `taskqueue-core` and `taskqueue-http` crates.

pub use taskqueue_core as core;
pub use taskqueue_http as http;
pub use taskqueue_shared as shared;
