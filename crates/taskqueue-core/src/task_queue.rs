//! The dual ready/processing structure.
//!
//! Both halves live behind one mutex so that "dequeue from ready, insert
//! into processing" ([`TaskQueue::poll`]) is a single critical section: no
//! other caller can observe the task as ready in the gap between the two
//! steps.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::SystemTime;

use taskqueue_shared::Task;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TaskQueueError {
    #[error("task id {0} is already in the processing set")]
    DuplicateId(u64),
    #[error("no such task id {0} in the processing set")]
    NoSuchTask(u64),
}

#[derive(Default)]
struct TaskQueueInner {
    ready: VecDeque<Task>,
    processing: HashMap<u64, Task>,
}

/// Dual FIFO-ready / keyed-processing task structure.
#[derive(Default)]
pub struct TaskQueue {
    inner: Mutex<TaskQueueInner>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("TaskQueue")
            .field("ready_len", &inner.ready.len())
            .field("processing_len", &inner.processing.len())
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail of the ready queue.
    pub fn enqueue_ready(&self, task: Task) {
        self.lock().ready.push_back(task);
    }

    /// Remove and return the task at the head of the ready queue, if any.
    pub fn dequeue_ready(&self) -> Option<Task> {
        self.lock().ready.pop_front()
    }

    pub fn is_ready_empty(&self) -> bool {
        self.lock().ready.is_empty()
    }

    /// Insert `task` into the processing set with a freshly touched
    /// heartbeat. Fails if its id is already present.
    pub fn move_to_processing(&self, mut task: Task) -> Result<(), TaskQueueError> {
        let mut inner = self.lock();
        if inner.processing.contains_key(&task.id) {
            return Err(TaskQueueError::DuplicateId(task.id));
        }
        task.last_heartbeat_at = SystemTime::now();
        inner.processing.insert(task.id, task);
        Ok(())
    }

    /// Remove the head of ready and hand it straight to processing under one
    /// lock acquisition, so it is never observably in neither or both sets.
    pub fn poll(&self) -> Option<Task> {
        let mut inner = self.lock();
        let mut task = inner.ready.pop_front()?;
        task.last_heartbeat_at = SystemTime::now();
        inner.processing.insert(task.id, task.clone());
        Some(task)
    }

    pub fn touch_processing(&self, id: u64) -> Result<(), TaskQueueError> {
        let mut inner = self.lock();
        match inner.processing.get_mut(&id) {
            Some(task) => {
                task.last_heartbeat_at = SystemTime::now();
                Ok(())
            }
            None => Err(TaskQueueError::NoSuchTask(id)),
        }
    }

    pub fn has_processing(&self, id: u64) -> bool {
        self.lock().processing.contains_key(&id)
    }

    pub fn pull_processing(&self, id: u64) -> Result<Task, TaskQueueError> {
        self.lock().processing.remove(&id).ok_or(TaskQueueError::NoSuchTask(id))
    }

    /// Remove and return every processing task whose last heartbeat is
    /// strictly older than `cutoff`.
    pub fn pull_stale_processing(&self, cutoff: SystemTime) -> Vec<Task> {
        let mut inner = self.lock();
        let stale_ids: Vec<u64> = inner
            .processing
            .iter()
            .filter(|(_, task)| task.last_heartbeat_at < cutoff)
            .map(|(id, _)| *id)
            .collect();
        stale_ids.into_iter().filter_map(|id| inner.processing.remove(&id)).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TaskQueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use taskqueue_shared::mail::Email;
    use taskqueue_shared::task::TaskPayload;

    #[derive(Debug)]
    struct StubPayload;
    impl TaskPayload for StubPayload {
        fn email_address(&self) -> &str {
            "user@example.com"
        }
        fn encode(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        fn failure_email(&self, _task_id: u64, _failure_count: u32) -> Email {
            Email::new("user@example.com", "failed", "body")
        }
    }

    fn stub_task(id: u64) -> Task {
        Task::new(id, Arc::new(StubPayload))
    }

    #[test]
    fn fifo_order_preserved() {
        let q = TaskQueue::new();
        q.enqueue_ready(stub_task(1));
        q.enqueue_ready(stub_task(2));
        assert_eq!(q.dequeue_ready().unwrap().id, 1);
        assert_eq!(q.dequeue_ready().unwrap().id, 2);
        assert!(q.dequeue_ready().is_none());
    }

    #[test]
    fn poll_moves_task_straight_into_processing() {
        let q = TaskQueue::new();
        q.enqueue_ready(stub_task(1));
        let task = q.poll().expect("task available");
        assert_eq!(task.id, 1);
        assert!(q.is_ready_empty());
        assert!(q.has_processing(1));
    }

    #[test]
    fn move_to_processing_rejects_duplicate_id() {
        let q = TaskQueue::new();
        q.move_to_processing(stub_task(1)).unwrap();
        let err = q.move_to_processing(stub_task(1)).unwrap_err();
        assert_eq!(err, TaskQueueError::DuplicateId(1));
    }

    #[test]
    fn touch_processing_fails_for_unknown_id() {
        let q = TaskQueue::new();
        let err = q.touch_processing(99).unwrap_err();
        assert_eq!(err, TaskQueueError::NoSuchTask(99));
    }

    #[test]
    fn pull_stale_processing_only_returns_old_entries() {
        let q = TaskQueue::new();
        q.move_to_processing(stub_task(1)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let cutoff = SystemTime::now();
        q.move_to_processing(stub_task(2)).unwrap();

        let stale = q.pull_stale_processing(cutoff);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, 1);
        assert!(!q.has_processing(1));
        assert!(q.has_processing(2));
    }

    #[test]
    fn pull_processing_removes_and_returns() {
        let q = TaskQueue::new();
        q.move_to_processing(stub_task(1)).unwrap();
        let task = q.pull_processing(1).unwrap();
        assert_eq!(task.id, 1);
        assert!(q.pull_processing(1).is_err());
    }
}
