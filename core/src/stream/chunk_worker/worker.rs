use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use tracing::{debug, trace};

use crate::stream::chunking::DataChunk;
use crate::stream::control::ControlPlane;
use crate::stream::parallelism::CoreGate;
use crate::types::StreamError;

use super::types::{ChunkTransform, ProcessedChunk};

/// Worker run loop: pull a chunk, transform it, push the result.
///
/// Exits when the input queue is closed and drained, or as soon as the run is
/// cancelled. A transform error is reported to the control plane, never sent
/// downstream.
pub fn run_worker<T: ChunkTransform>(
    id: usize,
    transform: &T,
    rx: Receiver<DataChunk>,
    tx: Sender<ProcessedChunk>,
    control: &ControlPlane,
    gate: Option<&CoreGate>,
) {
    trace!(worker = id, stage = ?T::STAGE, "worker started");
    let mut processed_count = 0u64;

    loop {
        if control.should_stop() {
            break;
        }

        let chunk = select! {
            recv(rx) -> msg => match msg {
                Ok(chunk) => chunk,
                Err(_) => break,
            },
            recv(control.cancel_signal()) -> _ => break,
            recv(control.external_signal()) -> _ => {
                control.fail(StreamError::Cancelled);
                break;
            }
        };

        // A chunk may have won the select race against cancellation.
        if control.should_stop() {
            break;
        }

        let position = chunk.position;
        let permit = match gate {
            Some(gate) => match gate.enter(control) {
                Some(permit) => Some(permit),
                None => break,
            },
            None => None,
        };

        let start = Instant::now();
        let result = transform.process(chunk);
        let elapsed = start.elapsed();
        drop(permit);

        let chunk = match result {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(worker = id, position, error = %e, "chunk failed");
                control.fail(e);
                break;
            }
        };

        let out = ProcessedChunk { chunk, stage: T::STAGE, elapsed };
        select! {
            send(tx, out) -> res => {
                if res.is_err() {
                    break;
                }
            }
            recv(control.cancel_signal()) -> _ => break,
            recv(control.external_signal()) -> _ => {
                control.fail(StreamError::Cancelled);
                break;
            }
        }
        processed_count += 1;
    }

    trace!(worker = id, processed = processed_count, "worker exiting");
}
