//! Key material and passphrase derivation.
//!
//! A passphrase is turned into key bytes by hashing it with MD5 and taking the
//! lower-case hex rendering of the digest as the key itself: 16 digest bytes
//! become 32 ASCII characters, which is exactly an AES-256 / ChaCha20 key.
//!
//! Security notes:
//! - MD5 is fast and not memory-hard, so low-entropy passphrases are cheap to
//!   brute force. The scheme is kept because files produced by existing tools
//!   are keyed this way; swapping in a slow KDF would make those files
//!   undecryptable from the same passphrase.
//! - Callers holding real random keys should use [`KeyMaterial::from_bytes`].

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use md5::{Digest, Md5};

use crate::crypto::types::KEY_LEN_32;
use crate::types::ConfigError;

/// Fixed-length symmetric key, validated at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    bytes: [u8; KEY_LEN_32],
}

impl KeyMaterial {
    /// Derive key bytes from a passphrase (hex-encoded MD5 of the UTF-8 bytes).
    pub fn from_passphrase(passphrase: &str) -> Self {
        let hex_digest = md5_hex_from_str(passphrase);
        let mut bytes = [0u8; KEY_LEN_32];
        bytes.copy_from_slice(hex_digest.as_bytes());
        Self { bytes }
    }

    /// Wrap raw key bytes. The length must match the cipher key size.
    pub fn from_bytes(key: &[u8]) -> Result<Self, ConfigError> {
        let bytes: [u8; KEY_LEN_32] = key.try_into().map_err(|_| ConfigError::InvalidKeyLen {
            expected: KEY_LEN_32,
            actual: key.len(),
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").field("len", &self.bytes.len()).finish_non_exhaustive()
    }
}

/// Lower-case hex MD5 of a string.
pub fn md5_hex_from_str(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Lower-case hex MD5 of a file's contents, streamed.
/// Handy for comparing an input file with its decrypted copy.
pub fn md5_hex_from_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
