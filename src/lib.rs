//! # windowstat
//!
//! Aggregate statistics over a sliding 60-second window of timestamped events,
//! with constant cost per update and per query.
//!
//! ## Usage
//!
//! ```bash
//! windowstat serve [--config windowstat.toml] [--port 8080]
//! curl -X POST --data '1700000000,0.33323,235424234' localhost:8080/event
//! curl localhost:8080/stats
//! ```
//!
//! ## Modules
//!
//! - `clock` - Time source abstraction with system and mock implementations
//! - `config` - Layered service configuration (defaults, TOML, environment)
//! - `error` - Crate error type
//! - `ingest` - Decoding of comma-separated wire events
//! - `server` - axum HTTP routes over a shared window
//! - `stats` - Buckets, the sliding window and folded snapshots
pub mod clock;
pub mod config;
pub mod error;
pub mod ingest;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use stats::{AggregateStats, SlidingWindow, WindowPolicy};
