// # 📂 `src/stream/chunk_worker/encrypt.rs`

use bytes::Bytes;

use crate::crypto::AeadImpl;
use crate::stream::chunking::DataChunk;
use crate::telemetry::Stage;
use crate::types::StreamError;

use super::types::{ChunkCryptoContext, ChunkTransform};

pub struct EncryptChunkWorker {
    pub crypto: ChunkCryptoContext,
}

impl EncryptChunkWorker {
    pub fn new(crypto: ChunkCryptoContext) -> Self {
        Self { crypto }
    }
}

impl ChunkTransform for EncryptChunkWorker {
    const STAGE: Stage = Stage::Encrypt;

    fn process(&self, chunk: DataChunk) -> Result<DataChunk, StreamError> {
        encrypt_chunk(self.crypto.aead(), chunk)
    }
}

/// Seal one plaintext chunk under a fresh nonce.
///
/// Output payload: `nonce(12) || ciphertext || tag(16)`, position unchanged.
/// An empty plaintext still produces a 28-byte chunk.
pub fn encrypt_chunk(aead: &AeadImpl, chunk: DataChunk) -> Result<DataChunk, StreamError> {
    let wire = aead.seal_chunk(&chunk.payload)?;
    Ok(DataChunk {
        position: chunk.position,
        payload: Bytes::from(wire),
    })
}
