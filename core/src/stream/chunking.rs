//! Chunk source: splits a reader into fixed-size, position-tagged chunks.
//!
//! Chunk boundaries are pure arithmetic on the stream: every chunk except the
//! last is exactly `chunk_size` bytes. For ciphertext the caller passes the
//! encrypted chunk size (`chunk_size + nonce + tag`), which is how chunk
//! boundaries are recovered on decrypt without any framing.

use std::io::Read;
use std::iter::FusedIterator;

use bytes::Bytes;

use crate::crypto::CHUNK_OVERHEAD;
use crate::stream::io::read_exact_or_eof;
use crate::types::{ConfigError, StreamError};

/// One unit of work flowing through the pipeline.
///
/// `position` is assigned at split time and never changes; it is the only
/// ordering key the reassembler uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub position: u64,
    pub payload: Bytes,
}

impl DataChunk {
    pub fn new(position: u64, payload: impl Into<Bytes>) -> Self {
        Self { position, payload: payload.into() }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Lazy, finite, non-restartable chunk sequence over a reader.
///
/// Yields `Err` at most once (the failing read) and is fused afterwards.
#[derive(Debug)]
pub struct ChunkSource<R> {
    reader: R,
    chunk_size: usize,
    next_position: u64,
    done: bool,
}

impl<R: Read> ChunkSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            reader,
            chunk_size,
            next_position: 0,
            done: false,
        }
    }

    /// Number of chunks produced so far.
    pub fn produced(&self) -> u64 {
        self.next_position
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<R: Read> Iterator for ChunkSource<R> {
    type Item = Result<DataChunk, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match read_exact_or_eof(&mut self.reader, self.chunk_size) {
            Ok(buf) if buf.is_empty() => {
                self.done = true;
                None
            }
            Ok(buf) => {
                // A short fill means the reader hit EOF.
                if buf.len() < self.chunk_size {
                    self.done = true;
                }
                let position = self.next_position;
                self.next_position += 1;
                Some(Ok(DataChunk { position, payload: buf }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for ChunkSource<R> {}

/// Size of one full encrypted chunk for a given plaintext chunk size.
/// `None` once the record would not fit in a single allocation.
pub fn encrypted_chunk_size(chunk_size: usize) -> Option<usize> {
    chunk_size
        .checked_add(CHUNK_OVERHEAD)
        .filter(|&n| n <= isize::MAX as usize)
}

/// Reject chunk sizes no run can accept: zero, or too large for one record.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), ConfigError> {
    if chunk_size == 0 {
        return Err(ConfigError::ZeroChunkSize);
    }
    if encrypted_chunk_size(chunk_size).is_none() {
        return Err(ConfigError::ChunkSizeOverflow { chunk_size });
    }
    Ok(())
}

/// Number of chunks a stream of `len` bytes splits into.
pub fn chunk_count(len: u64, chunk_size: usize) -> u64 {
    len.div_ceil(chunk_size as u64)
}
