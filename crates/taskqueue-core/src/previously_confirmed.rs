//! Bounded record of redeemed confirmation codes.
//!
//! An unbounded set here would be a known growth source over a long-lived
//! process; a fixed-capacity LRU is behaviourally equivalent for reasonable
//! confirmation windows. `moka` covers this kind of TTL/LRU need.

use moka::sync::Cache;

/// Tracks confirmation codes that have already been redeemed, so a
/// double-click on the confirmation link answers `already_confirmed`
/// instead of a bare 404.
#[derive(Debug, Clone)]
pub struct PreviouslyConfirmed {
    cache: Cache<String, ()>,
}

impl PreviouslyConfirmed {
    pub fn new(capacity: u64) -> Self {
        Self { cache: Cache::new(capacity) }
    }

    pub fn mark(&self, code: &str) {
        self.cache.insert(code.to_string(), ());
    }

    pub fn contains(&self, code: &str) -> bool {
        self.cache.contains_key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_and_queries() {
        let set = PreviouslyConfirmed::new(10);
        assert!(!set.contains("ABC"));
        set.mark("ABC");
        assert!(set.contains("ABC"));
    }
}
