// ## 📂 File: `src/stream/io.rs`
// ## Normalized I/O + ordered chunk writer

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;
use tracing::trace;

use crate::constants::{FILE_WRITE_BUFFER, READ_PREALLOC_LIMIT};
use crate::stream::chunking::DataChunk;
use crate::telemetry::{Stage, StageTimes, TelemetryCounters};
use crate::types::StreamError;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    Memory,
}

impl std::fmt::Debug for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Reader(_) => f.write_str("InputSource::Reader"),
            InputSource::File(p) => f.debug_tuple("InputSource::File").field(p).finish(),
            InputSource::Memory(b) => f.debug_tuple("InputSource::Memory").field(&b.len()).finish(),
        }
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSink::Writer(_) => f.write_str("OutputSink::Writer"),
            OutputSink::File(p) => f.debug_tuple("OutputSink::File").field(p).finish(),
            OutputSink::Memory => f.write_str("OutputSink::Memory"),
        }
    }
}

/// Normalize input source into a boxed reader
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, StreamError> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => {
            let file = File::open(&p).map_err(|e| StreamError::io("failed to open input file", e))?;
            Box::new(file)
        }
        InputSource::Memory(b) => Box::new(Cursor::new(b)),
    };
    Ok(reader)
}

/// Normalize output sink into a boxed writer.
///
/// For [`OutputSink::Memory`] the shared buffer is returned alongside the
/// writer; it holds the output once the writer is dropped.
pub fn open_output(
    sink: OutputSink,
) -> Result<(Box<dyn Write + Send>, Option<SharedBuffer>), StreamError> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => {
            let file = File::create(&p).map_err(|e| StreamError::io("failed to create output file", e))?;
            Ok((Box::new(BufWriter::with_capacity(FILE_WRITE_BUFFER, file)), None))
        }
        OutputSink::Memory => {
            let buf = SharedBuffer::default();
            Ok((Box::new(buf.writer()), Some(buf)))
        }
    }
}

/// Output buffer shared between the reassembler thread and the caller.
/// Appends are serialized by the mutex; the caller takes the bytes after the
/// run has joined.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: Arc::new(Mutex::new(Vec::with_capacity(capacity))) }
    }

    pub fn writer(&self) -> SharedBufferWriter {
        SharedBufferWriter { buf: self.inner.clone() }
    }

    /// Take the accumulated bytes, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fill up to `len` bytes, stopping early only at EOF. Short reads from the
/// underlying reader are retried, so only the final chunk can come back short.
/// The buffer grows with the data, so a short input never pays for a full chunk.
pub fn read_exact_or_eof<R: Read>(r: &mut R, len: usize) -> Result<Bytes, StreamError> {
    let mut buf = Vec::with_capacity(len.min(READ_PREALLOC_LIMIT));
    r.by_ref()
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| StreamError::io("failed to read input", e))?;
    Ok(Bytes::from(buf))
}

// ================= Ordered writer =================

/// Writes chunks in strictly ascending position order regardless of the
/// order they arrive in. Early arrivals wait in `pending`.
pub struct OrderedChunkWriter<W: Write> {
    out: W,
    next: u64,
    pending: BTreeMap<u64, Bytes>,
    counters: TelemetryCounters,
    stage_times: StageTimes,
}

impl<W: Write> OrderedChunkWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
            counters: TelemetryCounters::default(),
            stage_times: StageTimes::default(),
        }
    }

    /// Position of the next chunk to be written.
    pub fn next_position(&self) -> u64 {
        self.next
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, chunk: DataChunk) -> Result<(), StreamError> {
        if chunk.position < self.next || self.pending.contains_key(&chunk.position) {
            return Err(StreamError::Pipeline("duplicate chunk position"));
        }
        self.pending.insert(chunk.position, chunk.payload);
        self.flush_ready()
    }

    /// Flush the writer and return what was written. Fails if a gap is left.
    pub fn finish(mut self) -> Result<(TelemetryCounters, StageTimes), StreamError> {
        if !self.pending.is_empty() {
            return Err(StreamError::Pipeline("missing chunk before end of stream"));
        }
        let start = Instant::now();
        self.out.flush().map_err(|e| StreamError::io("failed to flush output", e))?;
        self.stage_times.add(Stage::Write, start.elapsed());
        Ok((self.counters, self.stage_times))
    }

    fn flush_ready(&mut self) -> Result<(), StreamError> {
        while let Some(payload) = self.pending.remove(&self.next) {
            self.write(&payload)?;
            self.next += 1;
        }
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> Result<(), StreamError> {
        trace!(position = self.next, len = payload.len(), "writing chunk");
        let start = Instant::now();
        self.out
            .write_all(payload)
            .map_err(|e| StreamError::io("failed to write output", e))?;
        self.stage_times.add(Stage::Write, start.elapsed());
        self.counters.add_written(payload.len());
        Ok(())
    }
}
