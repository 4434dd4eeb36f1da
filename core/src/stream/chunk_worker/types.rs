use std::sync::Arc;
use std::time::Duration;

use crate::crypto::{AeadImpl, CipherSuite, KeyMaterial};
use crate::stream::chunking::DataChunk;
use crate::telemetry::Stage;
use crate::types::StreamError;

/// Immutable crypto context shared across workers
#[derive(Debug, Clone)]
pub struct ChunkCryptoContext {
    aead: Arc<AeadImpl>,
}

impl ChunkCryptoContext {
    pub fn new(suite: CipherSuite, key: &KeyMaterial) -> Result<Self, StreamError> {
        let aead = AeadImpl::from_key(suite, key)?;
        Ok(Self { aead: Arc::new(aead) })
    }

    pub fn aead(&self) -> &AeadImpl {
        &self.aead
    }

    pub fn suite(&self) -> CipherSuite {
        self.aead.suite()
    }
}

/// One chunk's worth of cipher work. Implemented by the encrypt and decrypt
/// workers so both share one run loop.
pub trait ChunkTransform: Sync {
    /// Stage the work time is attributed to.
    const STAGE: Stage;

    fn process(&self, chunk: DataChunk) -> Result<DataChunk, StreamError>;
}

/// Output of a worker
#[derive(Debug)]
pub struct ProcessedChunk {
    pub chunk: DataChunk,
    pub stage: Stage,
    pub elapsed: Duration,
}
