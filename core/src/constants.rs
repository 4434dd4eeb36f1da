/// Default plaintext chunk size (10 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Default number of chunk workers. Also the capacity of both pipeline queues.
pub const DEFAULT_WORKERS: usize = 10;

/// Suffix appended to the input path by `Cypher::encrypt_file`.
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";
/// Suffix appended to the input path by `Cypher::decrypt_file`.
pub const DECRYPTED_SUFFIX: &str = ".decrypted";

/// Buffered writer capacity used for file sinks.
pub const FILE_WRITE_BUFFER: usize = 1024 * 1024;

/// Upper bound on what a chunk read reserves up front; larger chunks grow as
/// data arrives.
pub const READ_PREALLOC_LIMIT: usize = 16 * 1024 * 1024;
