//! Concurrent sliding-window aggregator
//!
//! All state sits behind one mutex. `update` reads the clock, rolls the open
//! bucket into history if the second has moved on, and folds the event in,
//! all inside a single critical section. `snapshot` folds under the same lock,
//! so readers never see a bucket that has been sealed but not yet replaced.
//!
//! An event is admitted only while the summed magnitudes of every bucket in
//! the window stay representable, so no fold over any subset of buckets can
//! overflow.

use super::bucket::{Bucket, SealedBucket, SumOverflow};
use super::snapshot::AggregateStats;
use crate::clock::{Clock, SystemClock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::iter;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Width of the window in seconds, and the number of sealed buckets kept
pub const WINDOW_SECONDS: usize = 60;

/// Which buckets a snapshot folds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPolicy {
    /// The open bucket plus every sealed bucket, however old
    #[default]
    LastBuckets,
    /// Only buckets whose second lies within the last 60 seconds of the clock
    TrailingSeconds,
}

impl WindowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowPolicy::LastBuckets => "last-buckets",
            WindowPolicy::TrailingSeconds => "trailing-seconds",
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-buckets" | "last_buckets" | "buckets" => Ok(WindowPolicy::LastBuckets),
            "trailing-seconds" | "trailing_seconds" | "seconds" => {
                Ok(WindowPolicy::TrailingSeconds)
            }
            other => Err(format!("unknown window policy '{other}'")),
        }
    }
}

#[derive(Debug)]
struct WindowState {
    current: Bucket,
    history: VecDeque<SealedBucket>,
    // Magnitudes summed over `history`, refreshed on every rollover
    sealed_magnitude_x: Decimal,
    sealed_magnitude_y: u128,
}

impl WindowState {
    fn new(second: i64) -> Self {
        Self {
            current: Bucket::new(second),
            history: VecDeque::with_capacity(WINDOW_SECONDS),
            sealed_magnitude_x: Decimal::ZERO,
            sealed_magnitude_y: 0,
        }
    }

    /// Seal the open bucket and open a fresh one for `now`
    fn roll_over(&mut self, now: i64) {
        let sealed = std::mem::replace(&mut self.current, Bucket::new(now)).seal();
        if self.history.len() >= WINDOW_SECONDS {
            self.history.pop_front();
        }
        trace!(
            sealed_second = sealed.second(),
            sealed_count = sealed.count(),
            now,
            "rolled window forward"
        );
        self.history.push_back(sealed);

        let (magnitude_x, magnitude_y) = self.history.iter().map(SealedBucket::as_bucket).fold(
            (Decimal::ZERO, 0u128),
            |(mx, my), b| {
                (
                    mx.saturating_add(b.magnitude_x()),
                    my.saturating_add(b.magnitude_y()),
                )
            },
        );
        self.sealed_magnitude_x = magnitude_x;
        self.sealed_magnitude_y = magnitude_y;
    }

    /// Check that `(x, y)` keeps every window sum in range
    fn admit(&self, x: Decimal, y: i64) -> Result<(), SumOverflow> {
        self.sealed_magnitude_x
            .checked_add(self.current.magnitude_x())
            .and_then(|m| m.checked_add(x.abs()))
            .ok_or(SumOverflow::X)?;

        let magnitude_y = self
            .sealed_magnitude_y
            .saturating_add(self.current.magnitude_y())
            .saturating_add(u128::from(y.unsigned_abs()));
        if magnitude_y > i64::MAX as u128 {
            return Err(SumOverflow::Y);
        }
        Ok(())
    }

    fn buckets(&self) -> impl Iterator<Item = &Bucket> + '_ {
        self.history
            .iter()
            .map(SealedBucket::as_bucket)
            .chain(iter::once(&self.current))
    }
}

/// Aggregates events over a trailing window of one-second buckets
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use windowstat::stats::SlidingWindow;
///
/// let window = SlidingWindow::new();
/// window.update(Decimal::new(105, 1), 100, 1_700_000_000).unwrap();
///
/// let stats = window.snapshot();
/// assert_eq!(stats.count, 1);
/// assert_eq!(stats.sum_y, 100);
/// ```
pub struct SlidingWindow {
    state: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
    policy: WindowPolicy,
}

impl SlidingWindow {
    /// Create a window on the system clock with the default policy
    pub fn new() -> Self {
        Self::with_policy(WindowPolicy::default())
    }

    pub fn with_policy(policy: WindowPolicy) -> Self {
        Self::with_clock(Arc::new(SystemClock::new()), policy)
    }

    /// Create a window on an explicit clock; the open bucket starts at the
    /// clock's current second
    pub fn with_clock(clock: Arc<dyn Clock>, policy: WindowPolicy) -> Self {
        let start = clock.now_secs();
        Self {
            state: Mutex::new(WindowState::new(start)),
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Record one event
    ///
    /// The bucket is chosen by the clock's current second. `timestamp` is the
    /// caller's own event time and is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`SumOverflow`] and leaves the window's totals untouched when the
    /// summed `|x|` or `|y|` across the window would leave its numeric range.
    pub fn update(&self, x: Decimal, y: i64, timestamp: i64) -> Result<(), SumOverflow> {
        {
            let mut state = self.lock();
            let now = self.clock.now_secs();
            // A clock stepping backwards keeps folding into the open bucket
            if now > state.current.second() {
                state.roll_over(now);
            }
            state.admit(x, y)?;
            state.current.add(x, y)?;
        }
        trace!(timestamp, %x, y, "event recorded");
        Ok(())
    }

    /// Fold the open bucket and the history into one result
    pub fn snapshot(&self) -> AggregateStats {
        let state = self.lock();
        match self.policy {
            WindowPolicy::LastBuckets => AggregateStats::fold(state.buckets()),
            WindowPolicy::TrailingSeconds => {
                let cutoff = self.clock.now_secs() - WINDOW_SECONDS as i64;
                AggregateStats::fold(state.buckets().filter(|b| b.second() > cutoff))
            }
        }
    }

    /// Number of sealed buckets currently held
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        // Keep serving after a writer panicked mid-update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlidingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindow")
            .field("policy", &self.policy)
            .field("history_len", &self.history_len())
            .finish()
    }
}
