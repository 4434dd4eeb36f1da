// # 📂 `src/stream/chunk_worker/mod.rs`

//! Chunk workers: seal or open one chunk at a time, pulled from a shared
//! bounded queue. Output order is not preserved here; the reassembler restores
//! it from each chunk's position.

pub mod types;
pub mod encrypt;
pub mod decrypt;
pub mod worker;

pub use types::{ChunkCryptoContext, ChunkTransform, ProcessedChunk};
pub use encrypt::{encrypt_chunk, EncryptChunkWorker};
pub use decrypt::{decrypt_chunk, DecryptChunkWorker};
pub use worker::run_worker;
