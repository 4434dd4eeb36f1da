//! telemetry/snapshot.rs
//! Immutable summary of a finished pipeline run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub chunks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub workers: usize,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
    /// Captured output for [`OutputSink::Memory`](crate::stream::OutputSink::Memory) runs.
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer, workers: usize) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            chunks: counters.chunks,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            workers,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
            output: None,
        }
    }

    pub fn attach_output(&mut self, buf: Vec<u8>) {
        self.output = Some(buf);
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    /// True when every listed stage recorded some time.
    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|s| self.stage_times.get(*s) > Duration::ZERO)
    }

    pub fn stage(&self, stage: Stage) -> Duration {
        self.stage_times.get(stage)
    }

    /// Size change introduced by the run: positive when encrypting.
    pub fn overhead_bytes(&self) -> i64 {
        self.bytes_out as i64 - self.bytes_in as i64
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
