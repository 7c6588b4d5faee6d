//! The broker's view of a task: bookkeeping fields it owns directly, plus an
//! opaque payload supplied by a model registry. The registry's parameter
//! hierarchy is its own concern; the broker only ever sees this capability
//! interface.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::mail::Email;

/// Capability interface a model registry's decoded payload must satisfy.
///
/// The broker never inspects the payload's internal structure; it only ever
/// calls these four methods. `encode` must serialize exactly the fields the
/// front-end's task dict carries apart from `taskId` and `failureCount`,
/// which the broker stamps on separately (see [`Task::encode`]).
pub trait TaskPayload: fmt::Debug + Send + Sync {
    /// Address results and failure notices are emailed to.
    fn email_address(&self) -> &str;

    /// Render the task dict's non-bookkeeping fields.
    fn encode(&self) -> serde_json::Value;

    /// Produce the failure notification email for this task at the given
    /// task id and failure count. Called once a task's retry budget is spent.
    fn failure_email(&self, task_id: u64, failure_count: u32) -> Email;
}

/// A single model-evaluation job, with the bookkeeping fields the broker
/// owns layered over an opaque, registry-supplied payload.
#[derive(Clone)]
pub struct Task {
    pub id: u64,
    pub payload: Arc<dyn TaskPayload>,
    pub failure_count: u32,
    pub enqueued_at: SystemTime,
    pub last_heartbeat_at: SystemTime,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("failure_count", &self.failure_count)
            .field("enqueued_at", &self.enqueued_at)
            .field("last_heartbeat_at", &self.last_heartbeat_at)
            .finish_non_exhaustive()
    }
}

impl Task {
    /// Wrap a freshly decoded payload as a brand-new task with the given id.
    pub fn new(id: u64, payload: Arc<dyn TaskPayload>) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            payload,
            failure_count: 0,
            enqueued_at: now,
            last_heartbeat_at: now,
        }
    }

    /// Clone this task under a fresh id, carrying over its failure count and
    /// payload. Recycling renames the id while keeping everything else.
    pub fn recycled_with_id(&self, new_id: u64, failure_count: u32) -> Self {
        let now = SystemTime::now();
        Self {
            id: new_id,
            payload: Arc::clone(&self.payload),
            failure_count,
            enqueued_at: now,
            last_heartbeat_at: now,
        }
    }

    /// Render the full task dict, with `taskId` and `failureCount` stamped on
    /// top of whatever the payload encodes.
    pub fn encode(&self) -> serde_json::Value {
        let mut dict = self.payload.encode();
        if let Some(obj) = dict.as_object_mut() {
            obj.insert("taskId".into(), serde_json::json!(self.id));
            obj.insert("failureCount".into(), serde_json::json!(self.failure_count));
        }
        dict
    }

    pub fn email_address(&self) -> &str {
        self.payload.email_address()
    }

    /// Render the failure notice at `failure_count`, which the caller
    /// passes explicitly rather than reading `self.failure_count` — the
    /// broker increments the count before emailing, and `Task` itself is
    /// never mutated in place.
    pub fn failure_email(&self, failure_count: u32) -> Email {
        self.payload.failure_email(self.id, failure_count)
    }
}
