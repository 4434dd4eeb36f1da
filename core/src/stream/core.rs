// ## 2️⃣ `core.rs`: stable public API

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::constants::{DECRYPTED_SUFFIX, DEFAULT_CHUNK_SIZE, DEFAULT_WORKERS, ENCRYPTED_SUFFIX, FILE_WRITE_BUFFER};
use crate::crypto::{CipherSuite, KeyMaterial, CHUNK_OVERHEAD};
use crate::stream::chunk_worker::ChunkCryptoContext;
use crate::stream::chunking::chunk_count;
pub use crate::stream::chunking::validate_chunk_size;
use crate::stream::control::CancelToken;
use crate::stream::io::{open_input, open_output, InputSource, OutputSink, SharedBuffer};
use crate::stream::parallelism::{available_cores, ParallelismProfile};
use crate::stream::pipeline::{run_decrypt_pipeline, run_encrypt_pipeline, PipelineConfig};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{ConfigError, StreamError};

/// Tunables for a [`Cypher`]. All fields are validated by [`CypherConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CypherConfig {
    pub suite: CipherSuite,
    /// Plaintext bytes per chunk. Must match between encrypt and decrypt.
    pub chunk_size: usize,
    pub num_workers: usize,
    pub num_cores: usize,
}

impl Default for CypherConfig {
    fn default() -> Self {
        Self {
            suite: CipherSuite::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_workers: DEFAULT_WORKERS,
            num_cores: available_cores(),
        }
    }
}

impl CypherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_chunk_size(self.chunk_size)?;
        if self.num_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.num_cores == 0 {
            return Err(ConfigError::ZeroCores);
        }
        Ok(())
    }

    pub fn profile(&self) -> ParallelismProfile {
        ParallelismProfile::new(self.num_workers, self.num_cores)
    }
}

/// Builder for [`Cypher`]. Key length is checked when the builder is created,
/// everything else in [`CypherBuilder::build`].
#[derive(Debug, Clone)]
pub struct CypherBuilder {
    key: KeyMaterial,
    config: CypherConfig,
}

impl CypherBuilder {
    pub fn new(key: KeyMaterial) -> Self {
        Self { key, config: CypherConfig::default() }
    }

    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(KeyMaterial::from_passphrase(passphrase))
    }

    pub fn from_key_bytes(key: &[u8]) -> Result<Self, ConfigError> {
        Ok(Self::new(KeyMaterial::from_bytes(key)?))
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    /// Upper bound on cores used for cipher work; clamped to the host.
    pub fn num_cores(mut self, num_cores: usize) -> Self {
        self.config.num_cores = num_cores;
        self
    }

    pub fn cipher_suite(mut self, suite: CipherSuite) -> Self {
        self.config.suite = suite;
        self
    }

    pub fn config(mut self, config: CypherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Cypher, StreamError> {
        self.config.validate()?;
        let crypto = ChunkCryptoContext::new(self.config.suite, &self.key)?;
        Ok(Cypher { config: self.config, crypto })
    }
}

/// Parallel chunked AEAD encryptor/decryptor.
///
/// A `Cypher` is immutable after construction and can be shared across
/// threads; every call runs its own independent pipeline.
///
/// On-disk format is a bare sequence of `nonce(12) || ciphertext || tag(16)`
/// records, one per plaintext chunk, with no header. Decryption must use the
/// same chunk size and cipher suite that encryption used.
#[derive(Debug, Clone)]
pub struct Cypher {
    config: CypherConfig,
    crypto: ChunkCryptoContext,
}

impl Cypher {
    /// Default configuration keyed from a passphrase.
    pub fn new(passphrase: &str) -> Result<Self, StreamError> {
        CypherBuilder::from_passphrase(passphrase).build()
    }

    pub fn builder(key: KeyMaterial) -> CypherBuilder {
        CypherBuilder::new(key)
    }

    pub fn config(&self) -> &CypherConfig {
        &self.config
    }

    pub fn suite(&self) -> CipherSuite {
        self.config.suite
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Ciphertext length for a plaintext of `plain_len` bytes.
    pub fn encrypted_len(&self, plain_len: u64) -> u64 {
        plain_len + chunk_count(plain_len, self.config.chunk_size) * CHUNK_OVERHEAD as u64
    }

    /// Number of chunks a plaintext of `plain_len` bytes splits into.
    pub fn chunk_count(&self, plain_len: u64) -> u64 {
        chunk_count(plain_len, self.config.chunk_size)
    }

    // ============================================================
    // Files
    // ============================================================

    /// Encrypt `input` into `<input>.encrypted` and return that path.
    ///
    /// The input is opened before the output is created, so a missing input
    /// leaves no output behind. On a mid-run failure the partial output file
    /// is left in place and must not be trusted.
    #[instrument(level = "debug", skip(self, input), fields(input = %input.as_ref().display()))]
    pub fn encrypt_file<P: AsRef<Path>>(&self, input: P) -> Result<PathBuf, StreamError> {
        let input = input.as_ref();
        let output = with_suffix(input, ENCRYPTED_SUFFIX);
        self.transform_file(input, &output, run_encrypt_pipeline::<File, BufWriter<File>>)?;
        Ok(output)
    }

    /// Decrypt `input` into `<input>.decrypted` and return that path.
    #[instrument(level = "debug", skip(self, input), fields(input = %input.as_ref().display()))]
    pub fn decrypt_file<P: AsRef<Path>>(&self, input: P) -> Result<PathBuf, StreamError> {
        let input = input.as_ref();
        let output = with_suffix(input, DECRYPTED_SUFFIX);
        self.transform_file(input, &output, run_decrypt_pipeline::<File, BufWriter<File>>)?;
        Ok(output)
    }

    fn transform_file<F>(&self, input: &Path, output: &Path, run: F) -> Result<TelemetrySnapshot, StreamError>
    where
        F: FnOnce(File, BufWriter<File>, &ChunkCryptoContext, usize, &PipelineConfig) -> Result<TelemetrySnapshot, StreamError>,
    {
        let reader = File::open(input).map_err(|e| StreamError::io("failed to open input file", e))?;
        let file = File::create(output).map_err(|e| StreamError::io("failed to create output file", e))?;
        let writer = BufWriter::with_capacity(FILE_WRITE_BUFFER, file);

        let snapshot = run(reader, writer, &self.crypto, self.config.chunk_size, &self.pipeline_config(None))?;
        debug!(output = %output.display(), bytes_out = snapshot.bytes_out, "file written");
        Ok(snapshot)
    }

    // ============================================================
    // Buffers
    // ============================================================

    /// Encrypt an in-memory buffer. Empty input gives empty output.
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, StreamError> {
        let capacity = usize::try_from(self.encrypted_len(data.len() as u64)).unwrap_or(data.len());
        let out = SharedBuffer::with_capacity(capacity);
        run_encrypt_pipeline(Cursor::new(data), out.writer(), &self.crypto, self.config.chunk_size, &self.pipeline_config(None))?;
        Ok(out.take())
    }

    /// Decrypt an in-memory buffer produced by [`Cypher::encrypt`] or
    /// [`Cypher::encrypt_file`] with the same key and chunk size.
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, StreamError> {
        let out = SharedBuffer::with_capacity(data.len());
        run_decrypt_pipeline(Cursor::new(data), out.writer(), &self.crypto, self.config.chunk_size, &self.pipeline_config(None))?;
        Ok(out.take())
    }

    // ============================================================
    // Streams
    // ============================================================

    /// Encrypt from any reader into any writer.
    pub fn encrypt_io<R, W>(&self, reader: R, writer: W, cancel: Option<&CancelToken>) -> Result<TelemetrySnapshot, StreamError>
    where
        R: Read,
        W: Write + Send,
    {
        run_encrypt_pipeline(reader, writer, &self.crypto, self.config.chunk_size, &self.pipeline_config(cancel))
    }

    pub fn decrypt_io<R, W>(&self, reader: R, writer: W, cancel: Option<&CancelToken>) -> Result<TelemetrySnapshot, StreamError>
    where
        R: Read,
        W: Write + Send,
    {
        run_decrypt_pipeline(reader, writer, &self.crypto, self.config.chunk_size, &self.pipeline_config(cancel))
    }

    /// 🔐 Encrypt stream
    ///
    /// With [`OutputSink::Memory`] the produced bytes are attached to the
    /// returned snapshot's `output`.
    #[instrument(level = "debug", skip(self, cancel))]
    pub fn encrypt_stream(
        &self,
        input: InputSource,
        output: OutputSink,
        cancel: Option<&CancelToken>,
    ) -> Result<TelemetrySnapshot, StreamError> {
        let reader = open_input(input)?;
        let (writer, maybe_buf) = open_output(output)?;

        let mut snapshot = self.encrypt_io(reader, writer, cancel)?;
        if let Some(buf) = maybe_buf {
            snapshot.attach_output(buf.take());
        }
        Ok(snapshot)
    }

    /// 🔓 Decrypt stream
    #[instrument(level = "debug", skip(self, cancel))]
    pub fn decrypt_stream(
        &self,
        input: InputSource,
        output: OutputSink,
        cancel: Option<&CancelToken>,
    ) -> Result<TelemetrySnapshot, StreamError> {
        let reader = open_input(input)?;
        let (writer, maybe_buf) = open_output(output)?;

        let mut snapshot = self.decrypt_io(reader, writer, cancel)?;
        if let Some(buf) = maybe_buf {
            snapshot.attach_output(buf.take());
        }
        Ok(snapshot)
    }

    fn pipeline_config(&self, cancel: Option<&CancelToken>) -> PipelineConfig {
        PipelineConfig {
            profile: self.config.profile(),
            cancel: cancel.cloned(),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
