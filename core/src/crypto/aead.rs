//! AEAD interface for AES-256-GCM and ChaCha20-Poly1305.
//!
//! Design notes:
//! - Both ciphers use 32-byte keys, 12-byte nonces and 16-byte tags.
//! - Chunks carry no associated data.
//! - Tag verification is constant-time and fails closed (no partial plaintext).

use aes_gcm::aead::{Aead, AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce as ChaNonce};

use crate::crypto::kdf::KeyMaterial;
use crate::crypto::nonce::generate_nonce_12;
use crate::crypto::types::{CipherSuite, CryptoError, KEY_LEN_32, NONCE_LEN_12, TAG_LEN};

/// Unified AEAD cipher implementation selected by [`CipherSuite`].
#[derive(Clone)]
pub enum AeadImpl {
    AesGcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
}

impl AeadImpl {
    /// Construct the AEAD for `suite` from raw key bytes.
    pub fn new(suite: CipherSuite, key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != suite.key_len() {
            return Err(CryptoError::InvalidKeyLen {
                expected: suite.key_len(),
                actual: key.len(),
            });
        }

        match suite {
            CipherSuite::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(key)
                    .map_err(|_| CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() })?;
                Ok(Self::AesGcm(cipher))
            }
            CipherSuite::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(key)
                    .map_err(|_| CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() })?;
                Ok(Self::ChaCha(cipher))
            }
        }
    }

    pub fn from_key(suite: CipherSuite, key: &KeyMaterial) -> Result<Self, CryptoError> {
        Self::new(suite, key.as_bytes())
    }

    pub fn suite(&self) -> CipherSuite {
        match self {
            AeadImpl::AesGcm(_) => CipherSuite::Aes256Gcm,
            AeadImpl::ChaCha(_) => CipherSuite::ChaCha20Poly1305,
        }
    }

    /// AEAD seal: returns `ciphertext || tag`.
    pub fn seal(&self, nonce_12: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .encrypt(AesNonce::from_slice(nonce_12), plaintext)
                .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into())),
            AeadImpl::ChaCha(cipher) => cipher
                .encrypt(ChaNonce::from_slice(nonce_12), plaintext)
                .map_err(|_| CryptoError::Failure("ChaCha20-Poly1305 seal failed".into())),
        }
    }

    /// AEAD open: `ciphertext || tag` back to plaintext.
    pub fn open(&self, nonce_12: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;

        if ciphertext_and_tag.len() < TAG_LEN {
            return Err(CryptoError::TagMismatch);
        }

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .decrypt(AesNonce::from_slice(nonce_12), ciphertext_and_tag)
                .map_err(|_| CryptoError::TagMismatch),
            AeadImpl::ChaCha(cipher) => cipher
                .decrypt(ChaNonce::from_slice(nonce_12), ciphertext_and_tag)
                .map_err(|_| CryptoError::TagMismatch),
        }
    }

    /// Seal under a fresh random nonce and return the wire form
    /// `nonce || ciphertext || tag` in a single allocation.
    pub fn seal_chunk(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = generate_nonce_12()?;

        let mut wire = Vec::with_capacity(NONCE_LEN_12 + plaintext.len() + TAG_LEN);
        wire.extend_from_slice(&nonce);
        wire.extend_from_slice(plaintext);

        let body = &mut wire[NONCE_LEN_12..];
        let tag = match self {
            AeadImpl::AesGcm(cipher) => cipher
                .encrypt_in_place_detached(AesNonce::from_slice(&nonce), b"", body)
                .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into()))?,
            AeadImpl::ChaCha(cipher) => cipher
                .encrypt_in_place_detached(ChaNonce::from_slice(&nonce), b"", body)
                .map_err(|_| CryptoError::Failure("ChaCha20-Poly1305 seal failed".into()))?,
        };
        wire.extend_from_slice(tag.as_slice());

        Ok(wire)
    }
}

impl std::fmt::Debug for AeadImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AeadImpl").field(&self.suite()).finish()
    }
}

#[inline]
fn check_nonce(nonce: &[u8]) -> Result<(), CryptoError> {
    if nonce.len() != NONCE_LEN_12 {
        return Err(CryptoError::InvalidNonceLen {
            expected: NONCE_LEN_12,
            actual: nonce.len(),
        });
    }
    Ok(())
}
