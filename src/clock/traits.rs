/// Source of the current epoch second
///
/// Implementations must be cheap to call; the aggregator reads the clock
/// while holding its lock.
pub trait Clock: Send + Sync {
    /// Current time as whole seconds since the Unix epoch
    fn now_secs(&self) -> i64;
}
