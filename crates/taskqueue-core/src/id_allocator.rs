//! Monotonic task-id allocator.

use std::sync::atomic::{AtomicU64, Ordering};

/// Strictly increasing, thread-safe id generator. Starts at 0; the first
/// call to [`IdAllocator::next`] returns 1.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counter: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { counter: AtomicU64::new(0) }
    }

    /// Return the next id. Safe to call concurrently from any number of
    /// threads; no two calls ever return the same value.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
