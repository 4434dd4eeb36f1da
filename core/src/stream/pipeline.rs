// # 📂 src/stream/pipeline.rs

// ## 📂 File: `src/stream/pipeline.rs`
// ## Pure pipeline wiring (no crypto logic)
//
//   reader ──► [in queue] ──► N workers ──► [out queue] ──► ordered writer
//
// Both queues hold at most `inflight_chunks` chunks. The reader runs on the
// calling thread; workers and the writer run as scoped threads, so the call
// returns only after every stage has stopped.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::select;
use tracing::{debug, trace};

use crate::stream::chunk_worker::{
    run_worker, ChunkCryptoContext, ChunkTransform, DecryptChunkWorker, EncryptChunkWorker, ProcessedChunk,
};
use crate::stream::chunking::{encrypted_chunk_size, validate_chunk_size, ChunkSource, DataChunk};
use crate::stream::control::{CancelToken, ControlPlane};
use crate::stream::io::OrderedChunkWriter;
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{ConfigError, StreamError};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub profile: ParallelismProfile,
    /// Caller cancellation; firing it fails the run with `Cancelled`.
    pub cancel: Option<CancelToken>,
}

impl PipelineConfig {
    pub fn new(profile: ParallelismProfile) -> Self {
        Self { profile, cancel: None }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ============================================================
// Encrypt pipeline
// ============================================================
/// Split `reader` into `chunk_size` plaintext chunks, seal each, and write
/// `nonce || ciphertext || tag` records to `writer` in order.
pub fn run_encrypt_pipeline<R, W>(
    reader: R,
    writer: W,
    crypto: &ChunkCryptoContext,
    chunk_size: usize,
    config: &PipelineConfig,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read,
    W: Write + Send,
{
    validate_chunk_size(chunk_size)?;
    debug!(suite = %crypto.suite(), chunk_size, "start encrypt pipeline");
    let worker = EncryptChunkWorker::new(crypto.clone());
    run_pipeline(reader, writer, &worker, chunk_size, config)
}

// ============================================================
// Decrypt pipeline
// ============================================================
/// Inverse of [`run_encrypt_pipeline`]. `chunk_size` is the plaintext chunk
/// size used at encryption time; the input is split on `chunk_size + 28`.
pub fn run_decrypt_pipeline<R, W>(
    reader: R,
    writer: W,
    crypto: &ChunkCryptoContext,
    chunk_size: usize,
    config: &PipelineConfig,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read,
    W: Write + Send,
{
    validate_chunk_size(chunk_size)?;
    let wire_chunk_size = encrypted_chunk_size(chunk_size).ok_or(ConfigError::ChunkSizeOverflow { chunk_size })?;
    debug!(suite = %crypto.suite(), chunk_size, wire_chunk_size, "start decrypt pipeline");
    let worker = DecryptChunkWorker::new(crypto.clone());
    run_pipeline(reader, writer, &worker, wire_chunk_size, config)
}

// ============================================================
// Generic pipeline
// ============================================================
/// Split `reader` into `source_chunk_size` chunks, run `transform` on each
/// across the worker pool, and write the results to `writer` in position
/// order.
pub fn run_pipeline<R, W, T>(
    reader: R,
    writer: W,
    transform: &T,
    source_chunk_size: usize,
    config: &PipelineConfig,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read,
    W: Write + Send,
    T: ChunkTransform,
{
    if source_chunk_size == 0 {
        return Err(ConfigError::ZeroChunkSize.into());
    }
    if source_chunk_size > isize::MAX as usize {
        return Err(ConfigError::ChunkSizeOverflow { chunk_size: source_chunk_size }.into());
    }
    let profile = config.profile;
    if profile.worker_count == 0 {
        return Err(ConfigError::ZeroWorkers.into());
    }
    if profile.core_limit == 0 {
        return Err(ConfigError::ZeroCores.into());
    }

    let mut timer = TelemetryTimer::new();
    let mut control = ControlPlane::new(config.cancel.as_ref());
    let gate = profile.core_gate();
    let inflight = profile.inflight_chunks.max(1);

    // ---- Channels ----
    let (in_tx, in_rx) = bounded::<DataChunk>(inflight);
    let (out_tx, out_rx) = bounded::<ProcessedChunk>(inflight);

    let mut read_counters = TelemetryCounters::default();
    let mut read_time = Duration::ZERO;

    let reassembled = {
        let control = &control;
        let gate = gate.as_ref();

        thread::scope(|scope| {
            // ---- Workers ----
            for id in 0..profile.worker_count {
                let rx = in_rx.clone();
                let tx = out_tx.clone();
                scope.spawn(move || run_worker(id, transform, rx, tx, control, gate));
            }
            drop(in_rx);
            drop(out_tx);

            // ---- Ordered writer ----
            let reassembler = scope.spawn(move || run_reassembler(out_rx, writer, control));

            // ---- Reader (this thread) ----
            let source = ChunkSource::new(reader, source_chunk_size);
            feed_chunks(source, in_tx, control, &mut read_counters, &mut read_time);
            if control.begin_drain() {
                trace!("source exhausted, draining");
            }

            match reassembler.join() {
                Ok(out) => out,
                Err(_) => {
                    control.fail(StreamError::Pipeline("reassembler thread panicked"));
                    None
                }
            }
        })
    };

    control.finish()?;
    let (write_counters, stage_times) =
        reassembled.ok_or(StreamError::Pipeline("reassembler stopped without finishing"))?;

    timer.finish();
    timer.add_stage_time(Stage::Read, read_time);
    timer.stage_times.merge(&stage_times);

    let mut counters = write_counters;
    counters.bytes_in = read_counters.bytes_in;

    let snapshot = TelemetrySnapshot::from(&counters, &timer, profile.worker_count);
    debug!(
        chunks = snapshot.chunks,
        bytes_in = snapshot.bytes_in,
        bytes_out = snapshot.bytes_out,
        elapsed_ms = snapshot.elapsed.as_millis() as u64,
        state = ?control.state(),
        "pipeline finished"
    );
    Ok(snapshot)
}

/// Reader stage. Dropping `tx` on return closes the input queue.
fn feed_chunks<R: Read>(
    mut source: ChunkSource<R>,
    tx: Sender<DataChunk>,
    control: &ControlPlane,
    counters: &mut TelemetryCounters,
    read_time: &mut Duration,
) {
    loop {
        if control.should_stop() {
            break;
        }

        let start = Instant::now();
        let next = source.next();
        *read_time += start.elapsed();

        let chunk = match next {
            None => break,
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                debug!(position = source.produced(), error = %e, "read failed");
                control.fail(e);
                break;
            }
        };
        counters.add_read(chunk.len());
        trace!(position = chunk.position, len = chunk.len(), "dispatching chunk");

        select! {
            send(tx, chunk) -> res => {
                if res.is_err() {
                    control.fail(StreamError::Pipeline("chunk queue closed"));
                    break;
                }
            }
            recv(control.cancel_signal()) -> _ => break,
            recv(control.external_signal()) -> _ => {
                control.fail(StreamError::Cancelled);
                break;
            }
        }
    }
    trace!(produced = source.produced(), "reader finished");
}

/// Writer stage: restore position order and emit.
fn run_reassembler<W: Write>(
    rx: Receiver<ProcessedChunk>,
    writer: W,
    control: &ControlPlane,
) -> Option<(TelemetryCounters, StageTimes)> {
    let mut ordered = OrderedChunkWriter::new(writer);
    let mut worker_times = StageTimes::default();

    loop {
        let processed = select! {
            recv(rx) -> msg => match msg {
                Ok(processed) => processed,
                Err(_) => break,
            },
            recv(control.cancel_signal()) -> _ => return None,
        };

        worker_times.add(processed.stage, processed.elapsed);
        if let Err(e) = ordered.push(processed.chunk) {
            debug!(next = ordered.next_position(), error = %e, "write failed");
            control.fail(e);
            return None;
        }
    }

    // Workers may have closed the queue because the run was cancelled.
    if control.is_cancelled() {
        return None;
    }

    match ordered.finish() {
        Ok((counters, mut times)) => {
            times.merge(&worker_times);
            Some((counters, times))
        }
        Err(e) => {
            control.fail(e);
            None
        }
    }
}
