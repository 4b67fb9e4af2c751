//! Sliding-window statistics
//!
//! Events are folded into one-second buckets. The open bucket is sealed into a
//! bounded history when the observed second moves on, and a snapshot folds the
//! open bucket together with the sealed ones.
//!
//! - `bucket` - per-second accumulators and their sealed form
//! - `snapshot` - the folded result and its wire encoding
//! - `window` - the concurrent aggregator tying both together

pub mod bucket;
pub mod snapshot;
pub mod window;

pub use bucket::{Bucket, SealedBucket, SumOverflow};
pub use snapshot::AggregateStats;
pub use window::{SlidingWindow, WindowPolicy, WINDOW_SECONDS};
