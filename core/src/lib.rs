//! cypher-core
//!
//! Parallel, chunked AEAD file and buffer encryption.
//! Input is split into fixed-size chunks, sealed by a pool of worker threads,
//! and written back in the original order.
//!
//! ```no_run
//! use cypher_core::prelude::*;
//!
//! # fn main() -> Result<(), StreamError> {
//! let cypher = Cypher::new("correct horse battery staple")?;
//! let sealed = cypher.encrypt(b"hello")?;
//! assert_eq!(cypher.decrypt(&sealed)?, b"hello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

pub mod crypto;
pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::crypto::{md5_hex_from_file, md5_hex_from_str, CipherSuite, KeyMaterial};
    pub use crate::stream::{CancelToken, Cypher, CypherBuilder, CypherConfig, InputSource, OutputSink};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{ConfigError, ErrorKind, StreamError};
}

pub use stream::{Cypher, CypherBuilder, CypherConfig};
pub use types::{ConfigError, ErrorKind, StreamError};
