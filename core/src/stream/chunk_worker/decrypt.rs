// # 📂 `src/stream/chunk_worker/decrypt.rs`

use bytes::Bytes;

use crate::crypto::{AeadImpl, CryptoError, NONCE_LEN_12};
use crate::stream::chunking::DataChunk;
use crate::telemetry::Stage;
use crate::types::StreamError;

use super::types::{ChunkCryptoContext, ChunkTransform};

pub struct DecryptChunkWorker {
    pub crypto: ChunkCryptoContext,
}

impl DecryptChunkWorker {
    pub fn new(crypto: ChunkCryptoContext) -> Self {
        Self { crypto }
    }
}

impl ChunkTransform for DecryptChunkWorker {
    const STAGE: Stage = Stage::Decrypt;

    fn process(&self, chunk: DataChunk) -> Result<DataChunk, StreamError> {
        decrypt_chunk(self.crypto.aead(), chunk)
    }
}

/// Open one `nonce || ciphertext || tag` chunk.
///
/// A payload too short to hold a nonce is rejected as malformed before any
/// cipher call; everything else that fails to open (including a body shorter
/// than the tag) is an authentication failure at this position.
pub fn decrypt_chunk(aead: &AeadImpl, chunk: DataChunk) -> Result<DataChunk, StreamError> {
    let position = chunk.position;
    if chunk.payload.len() < NONCE_LEN_12 {
        return Err(StreamError::MalformedChunk {
            position,
            len: chunk.payload.len(),
            min: NONCE_LEN_12,
        });
    }

    let (nonce, body) = chunk.payload.split_at(NONCE_LEN_12);
    let plaintext = aead.open(nonce, body).map_err(|e| match e {
        CryptoError::TagMismatch => StreamError::AuthenticationFailure { position },
        other => StreamError::Crypto(other),
    })?;

    Ok(DataChunk {
        position,
        payload: Bytes::from(plaintext),
    })
}
