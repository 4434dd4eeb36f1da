//! telemetry/counters.rs
//! Mutable counters collected during a run, converted into a
//! [`TelemetrySnapshot`](super::TelemetrySnapshot) at the end.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Chunks written by the reassembler.
    pub chunks: u64,
    /// Bytes read from the source.
    pub bytes_in: u64,
    /// Bytes written to the sink.
    pub bytes_out: u64,
}

impl TelemetryCounters {
    /// Record one chunk read from the source.
    pub fn add_read(&mut self, len: usize) {
        self.bytes_in += len as u64;
    }

    /// Record one chunk emitted by the reassembler.
    pub fn add_written(&mut self, len: usize) {
        self.chunks += 1;
        self.bytes_out += len as u64;
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
