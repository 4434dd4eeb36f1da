//! Pipeline control plane: cancellation, first-error slot, and run state.
//!
//! Every stage holds a shared reference to one [`ControlPlane`]. The first
//! stage to fail records its error and fires the cancellation token; every
//! later report is dropped. Blocking channel operations select on the token's
//! signal, so a cancelled run never leaves a thread parked on a full or empty
//! queue.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam::channel::{bounded, never, Receiver, Sender};
use tracing::{debug, trace};

use crate::types::StreamError;

/// Broadcast cancellation token.
///
/// Cloning shares the token. `signal()` returns a receiver that becomes ready
/// (disconnected) the moment the token is cancelled, for use in
/// `crossbeam::select!`.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    flag: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    /// Fire the token. Returns `true` only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        if self.inner.flag.swap(true, Ordering::SeqCst) {
            return false;
        }
        // Dropping the only sender disconnects every receiver at once.
        let mut trigger = self.inner.trigger.lock().unwrap_or_else(|e| e.into_inner());
        trigger.take();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

/// Run state of one pipeline.
///
/// `Running -> Draining -> Completed` on success,
/// `Running | Draining -> Cancelling -> Failed` on any failure.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running = 0,
    Draining = 1,
    Cancelling = 2,
    Completed = 3,
    Failed = 4,
}

impl PipelineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => PipelineState::Running,
            1 => PipelineState::Draining,
            2 => PipelineState::Cancelling,
            3 => PipelineState::Completed,
            _ => PipelineState::Failed,
        }
    }
}

#[derive(Debug)]
pub struct ControlPlane {
    cancel: CancelToken,
    external: Option<CancelToken>,
    external_signal: Receiver<()>,
    error: OnceLock<StreamError>,
    state: AtomicU8,
}

impl ControlPlane {
    /// `external` is an optional caller token; firing it fails the run with
    /// [`StreamError::Cancelled`].
    pub fn new(external: Option<&CancelToken>) -> Self {
        let external_signal = match external {
            Some(token) => token.signal().clone(),
            None => never(),
        };
        Self {
            cancel: CancelToken::new(),
            external: external.cloned(),
            external_signal,
            error: OnceLock::new(),
            state: AtomicU8::new(PipelineState::Running as u8),
        }
    }

    /// Report a failure. The first report wins and cancels the run; later
    /// reports are discarded. Never blocks.
    pub fn fail(&self, err: StreamError) -> bool {
        match self.error.set(err) {
            Ok(()) => {
                self.transition(&[PipelineState::Running, PipelineState::Draining], PipelineState::Cancelling);
                self.cancel.cancel();
                debug!(state = ?self.state(), "pipeline failure recorded, cancelling");
                true
            }
            Err(discarded) => {
                debug!(error = %discarded, "secondary pipeline error discarded");
                false
            }
        }
    }

    /// True once the run is cancelled. A fired caller token is turned into a
    /// recorded [`StreamError::Cancelled`] here.
    pub fn should_stop(&self) -> bool {
        if !self.cancel.is_cancelled() && self.external.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.fail(StreamError::Cancelled);
        }
        self.cancel.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Internal cancellation signal.
    pub fn cancel_signal(&self) -> &Receiver<()> {
        self.cancel.signal()
    }

    /// Caller cancellation signal (never ready when no token was supplied).
    pub fn external_signal(&self) -> &Receiver<()> {
        &self.external_signal
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Source exhausted without failure.
    pub fn begin_drain(&self) -> bool {
        self.transition(&[PipelineState::Running], PipelineState::Draining)
    }

    /// All stages joined; settle the terminal state and hand back the
    /// recorded error, if any. `state()` reports `Completed` or `Failed`
    /// afterwards.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        match self.error.take() {
            Some(err) => {
                self.state.store(PipelineState::Failed as u8, Ordering::SeqCst);
                debug!(error = %err, "pipeline failed");
                Err(err)
            }
            None => {
                self.state.store(PipelineState::Completed as u8, Ordering::SeqCst);
                debug!("pipeline completed");
                Ok(())
            }
        }
    }

    fn transition(&self, from: &[PipelineState], to: PipelineState) -> bool {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if !from.contains(&PipelineState::from_u8(current)) {
                return false;
            }
            match self.state.compare_exchange(current, to as u8, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => {
                    trace!(from = ?PipelineState::from_u8(current), to = ?to, "pipeline state transition");
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }
}
