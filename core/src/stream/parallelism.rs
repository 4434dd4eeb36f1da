use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::select;
use tracing::debug;

use crate::stream::control::ControlPlane;

/// Logical cores this process may use.
pub fn available_cores() -> usize {
    num_cpus::get().max(1)
}

/// Parallelism configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelismProfile {
    /// Worker threads doing seal/open.
    pub worker_count: usize,
    /// Capacity of each bounded queue (chunks in flight per stage).
    pub inflight_chunks: usize,
    /// How many workers may run a cipher operation at the same time.
    pub core_limit: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            worker_count: 1,
            inflight_chunks: 1,
            core_limit: 1,
        }
    }

    /// Profile for `workers` threads on at most `cores` cores. The core limit
    /// is clamped to what the host actually has.
    pub fn new(workers: usize, cores: usize) -> Self {
        let workers = workers.max(1);
        let core_limit = cores.clamp(1, available_cores());
        if core_limit < cores {
            debug!(requested = cores, available = core_limit, "core limit clamped to host cores");
        }
        Self {
            worker_count: workers,
            inflight_chunks: workers,
            core_limit,
        }
    }

    /// A gate is only needed when there are more workers than cores.
    pub fn core_gate(&self) -> Option<CoreGate> {
        (self.core_limit < self.worker_count).then(|| CoreGate::new(self.core_limit))
    }
}

/// Counting semaphore capping concurrent cipher work at the core limit.
#[derive(Debug)]
pub struct CoreGate {
    release: Sender<()>,
    acquire: Receiver<()>,
}

impl CoreGate {
    pub fn new(permits: usize) -> Self {
        let permits = permits.max(1);
        let (release, acquire) = bounded(permits);
        for _ in 0..permits {
            // Capacity equals permit count, so this never fails.
            let _ = release.try_send(());
        }
        Self { release, acquire }
    }

    /// Block for a permit. Returns `None` if the run is cancelled first.
    pub fn enter(&self, control: &ControlPlane) -> Option<CorePermit<'_>> {
        select! {
            recv(self.acquire) -> token => token.ok().map(|_| CorePermit { gate: self }),
            recv(control.cancel_signal()) -> _ => None,
        }
    }

    pub fn available(&self) -> usize {
        self.acquire.len()
    }
}

/// Held while a cipher operation runs; returns its permit on drop.
#[derive(Debug)]
pub struct CorePermit<'a> {
    gate: &'a CoreGate,
}

impl Drop for CorePermit<'_> {
    fn drop(&mut self) {
        let _ = self.gate.release.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_caps_cores_at_host() {
        let p = ParallelismProfile::new(4, usize::MAX);
        assert_eq!(p.worker_count, 4);
        assert_eq!(p.inflight_chunks, 4);
        assert_eq!(p.core_limit, available_cores());
    }

    #[test]
    fn gate_only_when_oversubscribed() {
        assert!(ParallelismProfile::new(1, 1).core_gate().is_none());
        assert!(ParallelismProfile::new(8, 1).core_gate().is_some());
    }

    #[test]
    fn permits_are_returned_on_drop() {
        let control = ControlPlane::new(None);
        let gate = CoreGate::new(2);
        let a = gate.enter(&control).unwrap();
        let _b = gate.enter(&control).unwrap();
        assert_eq!(gate.available(), 0);
        drop(a);
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn cancelled_run_does_not_wait_for_permit() {
        let control = ControlPlane::new(None);
        let gate = CoreGate::new(1);
        let _held = gate.enter(&control).unwrap();
        control.fail(crate::types::StreamError::Cancelled);
        assert!(gate.enter(&control).is_none());
    }
}
