//! Random nonce generation.
//!
//! Every chunk is sealed under its own nonce drawn from the OS CSPRNG, so
//! workers never coordinate. With 96-bit random nonces the collision bound
//! stays negligible well past 2^32 chunks per key.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::types::{CryptoError, NONCE_LEN_12};

/// Draw a fresh 12-byte nonce from the operating system RNG.
#[inline]
pub fn generate_nonce_12() -> Result<[u8; NONCE_LEN_12], CryptoError> {
    let mut nonce = [0u8; NONCE_LEN_12];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::NonceGeneration(e.to_string()))?;
    Ok(nonce)
}
