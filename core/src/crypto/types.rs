use std::fmt;

use thiserror::Error;

/// Stable key and nonce sizes.
pub const KEY_LEN_32: usize = 32;

/// Standard 12-byte nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// Bytes added to every chunk by encryption: nonce prefix plus tag.
pub const CHUNK_OVERHEAD: usize = NONCE_LEN_12 + TAG_LEN;

/// Supported AEAD constructions. Both take 32-byte keys and 12-byte nonces,
/// so the on-disk chunk layout is identical for either suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CipherSuite {
    #[default]
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn key_len(self) -> usize {
        KEY_LEN_32
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherSuite::Aes256Gcm => f.write_str("AES-256-GCM"),
            CipherSuite::ChaCha20Poly1305 => f.write_str("ChaCha20-Poly1305"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes for supported ciphers).
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// AEAD tag mismatch (authentication failure).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// OS random source failed while drawing a nonce.
    #[error("nonce generation failed: {0}")]
    NonceGeneration(String),

    /// General runtime error with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}
