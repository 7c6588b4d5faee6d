//! # taskqueue-core
//!
//! The broker engine: id allocation, the confirmation-code map, the dual
//! ready/processing task queue, and the heartbeat-driven expiry loop that
//! ties them together. See `taskqueue-http` for the HTTP surface built on
//! top of [`Broker`].

pub mod broker;
pub mod confirmation_map;
pub mod errors;
pub mod expiry_loop;
pub mod id_allocator;
pub mod previously_confirmed;
pub mod task_queue;

pub use broker::{Broker, PollOutcome};
pub use errors::{BadId, ConfirmOutcome};
pub use expiry_loop::ExpiryLoopHandle;
