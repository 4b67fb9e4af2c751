//! Manually driven clock for deterministic tests

use super::traits::Clock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Clock whose second only changes when told to
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the aggregator and keep another to advance it.
///
/// # Examples
///
/// ```
/// use windowstat::clock::{Clock, MockClock};
///
/// let clock = MockClock::new(100);
/// let shared = clock.clone();
/// clock.set(160);
/// assert_eq!(shared.now_secs(), 160);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<AtomicI64>,
}

impl MockClock {
    pub fn new(start_secs: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_secs)),
        }
    }

    /// Move the clock forward by `secs` seconds
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute epoch second
    pub fn set(&self, secs: i64) {
        self.now.store(secs, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for MockClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_visible_through_clones() {
        let clock = MockClock::new(10);
        let other = clock.clone();

        clock.advance(5);
        assert_eq!(other.now_secs(), 15);

        other.advance(-3);
        assert_eq!(clock.now_secs(), 12);
    }

    #[test]
    fn test_default_starts_at_epoch() {
        assert_eq!(MockClock::default().now_secs(), 0);
    }
}
