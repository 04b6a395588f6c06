//! Persistence layer
//!
//! Whole-graph snapshots written with `bincode` and compressed with gzip.
//! There is no write-ahead log; a snapshot is exactly as durable as the
//! file write that produced it.

pub mod snapshot;

pub use snapshot::SNAPSHOT_VERSION;
