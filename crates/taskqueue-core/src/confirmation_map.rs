//! Confirmation code map.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use taskqueue_shared::Task;

const CODE_LENGTH: usize = 16;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

struct ConfirmationEntry {
    task: Task,
    expires_at: Instant,
}

/// Maps opaque, one-time confirmation codes to the task awaiting redemption.
#[derive(Debug, Default)]
pub struct ConfirmationMap {
    entries: DashMap<String, ConfirmationEntry>,
}

impl std::fmt::Debug for ConfirmationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationEntry").field("task_id", &self.task.id).finish()
    }
}

impl ConfirmationMap {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Store `task` under a freshly generated code and return it.
    ///
    /// Regenerates on the (astronomically rare) event of a collision with an
    /// already-live code.
    pub fn put(&self, task: Task, confirm_timeout: Duration) -> String {
        loop {
            let code = generate_code();
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.entries.entry(code.clone()) {
                slot.insert(ConfirmationEntry { task, expires_at: Instant::now() + confirm_timeout });
                return code;
            }
        }
    }

    /// Atomically remove and return the task stored under `code`, if any.
    ///
    /// Does not itself check expiry — the endpoint boundary sweeps
    /// immediately beforehand to make that race window negligible.
    pub fn take(&self, code: &str) -> Option<Task> {
        self.entries.remove(code).map(|(_, entry)| entry.task)
    }

    /// Remove every entry whose deadline has passed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn generate_code() -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[fastrand::usize(..CODE_ALPHABET.len())] as char)
        .collect()
}
