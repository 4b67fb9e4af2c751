//! Time source abstraction for the aggregator
//!
//! The sliding window decides bucket membership from its own notion of the
//! current second, never from caller-supplied timestamps. Routing that read
//! through a trait lets production code use the wall clock while tests step
//! time forward one second at a time.
//!
//! # Usage
//!
//! ```
//! use windowstat::clock::{Clock, MockClock};
//!
//! let clock = MockClock::new(1_700_000_000);
//! clock.advance(1);
//! assert_eq!(clock.now_secs(), 1_700_000_001);
//! ```

mod mock;
mod real;
mod traits;

pub use mock::MockClock;
pub use real::SystemClock;
pub use traits::Clock;
