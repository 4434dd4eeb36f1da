//! telemetry/mod.rs
//! Counters, stage timers, and immutable snapshots for a pipeline run.
//!
//! Workers and the reassembler keep their own counters; the coordinator merges
//! them once at the end, so no locks or atomics sit on the hot path.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
