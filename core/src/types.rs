use std::io;

use thiserror::Error;

use crate::crypto::CryptoError;

/// Invalid configuration, rejected before any I/O happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk size {chunk_size} overflows the encrypted chunk length")]
    ChunkSizeOverflow { chunk_size: usize },

    #[error("worker count must be greater than zero")]
    ZeroWorkers,

    #[error("core count must be greater than zero")]
    ZeroCores,
}

/// Coarse classification of a [`StreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    MalformedChunk,
    AuthenticationFailure,
    Cancelled,
    /// A pipeline invariant broke (lost or duplicated chunk, stage panic).
    Internal,
}

/// Unified pipeline error.
/// - `From<T>` impls enable `?` across stages.
/// - Messages carry the stage context the failure came from.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Encrypted chunk too short to even hold its nonce.
    #[error("malformed chunk {position}: {len} bytes is shorter than the {min}-byte nonce")]
    MalformedChunk { position: u64, len: usize, min: usize },

    /// AEAD rejected the chunk (wrong key or corrupted data).
    #[error("authentication failed for chunk {position}: wrong key or corrupted data")]
    AuthenticationFailure { position: u64 },

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("pipeline error: {0}")]
    Pipeline(&'static str),
}

impl StreamError {
    pub fn io(context: &'static str, source: io::Error) -> Self {
        StreamError::Io { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::Config(_) => ErrorKind::Config,
            StreamError::Io { .. } => ErrorKind::Io,
            StreamError::MalformedChunk { .. } => ErrorKind::MalformedChunk,
            StreamError::AuthenticationFailure { .. } => ErrorKind::AuthenticationFailure,
            StreamError::Cancelled => ErrorKind::Cancelled,
            StreamError::Pipeline(_) => ErrorKind::Internal,
            StreamError::Crypto(CryptoError::TagMismatch) => ErrorKind::AuthenticationFailure,
            StreamError::Crypto(_) => ErrorKind::Config,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::io("I/O error", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_separates_cancellation_from_internal_failures() {
        assert_eq!(StreamError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(StreamError::Pipeline("duplicate chunk position").kind(), ErrorKind::Internal);
        assert_eq!(StreamError::Crypto(CryptoError::TagMismatch).kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(StreamError::from(ConfigError::ZeroWorkers).kind(), ErrorKind::Config);
    }
}
