// * ✅ buffer and file round trips through the Cypher API
// * ✅ chunk boundary sizes
// * ✅ wrong key, tampering, truncation
// * ✅ configuration validation
// * ✅ one Cypher shared across threads

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    use cypher_core::constants::{DECRYPTED_SUFFIX, ENCRYPTED_SUFFIX};
    use cypher_core::crypto::{md5_hex_from_file, CipherSuite, KeyMaterial, CHUNK_OVERHEAD, NONCE_LEN_12};
    use cypher_core::stream::{InputSource, OutputSink};
    use cypher_core::types::{ConfigError, ErrorKind, StreamError};
    use cypher_core::{Cypher, CypherBuilder};

    const CHUNK: usize = 64;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn cypher(pass: &str) -> Cypher {
        CypherBuilder::from_passphrase(pass)
            .chunk_size(CHUNK)
            .num_workers(4)
            .build()
            .unwrap()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    // ------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------
    #[test]
    fn roundtrip_at_chunk_boundaries() {
        let c = cypher("boundaries");
        for len in [0, 1, CHUNK - 1, CHUNK, CHUNK + 1, 2 * CHUNK, 3 * CHUNK + 7] {
            let data = pattern(len);
            let sealed = c.encrypt(&data).unwrap();
            assert_eq!(sealed.len() as u64, c.encrypted_len(len as u64), "len={len}");
            assert_eq!(c.decrypt(&sealed).unwrap(), data, "len={len}");
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let c = cypher("empty");
        assert!(c.encrypt(&[]).unwrap().is_empty());
        assert!(c.decrypt(&[]).unwrap().is_empty());
    }

    #[test]
    fn one_byte_input_is_one_full_record() {
        let c = cypher("tiny");
        let sealed = c.encrypt(b"x").unwrap();
        assert_eq!(sealed.len(), 1 + CHUNK_OVERHEAD);
    }

    #[test]
    fn encrypting_twice_differs() {
        let c = cypher("nonce");
        let data = pattern(CHUNK * 2);
        let a = c.encrypt(&data).unwrap();
        let b = c.encrypt(&data).unwrap();
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
        // Each record starts with its own nonce.
        assert_ne!(a[..NONCE_LEN_12], a[CHUNK + CHUNK_OVERHEAD..CHUNK + CHUNK_OVERHEAD + NONCE_LEN_12]);
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let sealed = cypher("right").encrypt(&pattern(5 * CHUNK)).unwrap();
        let err = cypher("wrong").decrypt(&sealed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn tampered_byte_reports_its_chunk() {
        let c = cypher("tamper");
        let mut sealed = c.encrypt(&pattern(3 * CHUNK)).unwrap();
        let record = CHUNK + CHUNK_OVERHEAD;
        sealed[record + NONCE_LEN_12 + 5] ^= 0x80;

        let err = c.decrypt(&sealed).unwrap_err();
        assert!(matches!(err, StreamError::AuthenticationFailure { position: 1 }), "{err}");
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let c = cypher("tamper");
        let mut sealed = c.encrypt(&pattern(CHUNK)).unwrap();
        sealed[0] ^= 0x01;
        assert!(matches!(c.decrypt(&sealed), Err(StreamError::AuthenticationFailure { position: 0 })));
    }

    #[test]
    fn truncated_tail_shorter_than_nonce_is_malformed() {
        let c = cypher("truncate");
        let sealed = c.encrypt(&pattern(CHUNK + 20)).unwrap();
        let cut = &sealed[..CHUNK + CHUNK_OVERHEAD + 5];

        let err = c.decrypt(cut).unwrap_err();
        assert!(matches!(err, StreamError::MalformedChunk { position: 1, len: 5, min: 12 }), "{err}");
        assert_eq!(err.kind(), ErrorKind::MalformedChunk);
    }

    #[test]
    fn truncated_tail_inside_tag_fails_authentication() {
        let c = cypher("truncate");
        let sealed = c.encrypt(&pattern(CHUNK + 20)).unwrap();
        let cut = &sealed[..sealed.len() - 3];
        assert!(matches!(c.decrypt(cut), Err(StreamError::AuthenticationFailure { position: 1 })));
    }

    #[test]
    fn mismatched_chunk_size_does_not_decrypt() {
        let data = pattern(4 * CHUNK);
        let sealed = cypher("size").encrypt(&data).unwrap();
        let other = CypherBuilder::from_passphrase("size").chunk_size(CHUNK * 2).build().unwrap();
        assert!(other.decrypt(&sealed).is_err());
    }

    #[test]
    fn chacha_roundtrip_and_suites_are_not_interchangeable() {
        let chacha = CypherBuilder::from_passphrase("suite")
            .chunk_size(CHUNK)
            .cipher_suite(CipherSuite::ChaCha20Poly1305)
            .build()
            .unwrap();
        let data = pattern(3 * CHUNK + 1);
        let sealed = chacha.encrypt(&data).unwrap();
        assert_eq!(chacha.decrypt(&sealed).unwrap(), data);

        let aes = cypher("suite");
        assert_eq!(aes.decrypt(&sealed).unwrap_err().kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn raw_key_and_passphrase_key_agree() {
        let key = KeyMaterial::from_passphrase("same");
        let from_bytes = CypherBuilder::from_key_bytes(key.as_bytes()).unwrap().chunk_size(CHUNK).build().unwrap();
        let sealed = from_bytes.encrypt(b"interop").unwrap();
        assert_eq!(cypher("same").decrypt(&sealed).unwrap(), b"interop");
    }

    // ------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------
    #[test]
    fn invalid_configuration_is_rejected() {
        let zero_chunk = CypherBuilder::from_passphrase("k").chunk_size(0).build().unwrap_err();
        assert!(matches!(zero_chunk, StreamError::Config(ConfigError::ZeroChunkSize)));

        let zero_workers = CypherBuilder::from_passphrase("k").num_workers(0).build().unwrap_err();
        assert!(matches!(zero_workers, StreamError::Config(ConfigError::ZeroWorkers)));

        let zero_cores = CypherBuilder::from_passphrase("k").num_cores(0).build().unwrap_err();
        assert!(matches!(zero_cores, StreamError::Config(ConfigError::ZeroCores)));

        let overflow = CypherBuilder::from_passphrase("k").chunk_size(usize::MAX).build().unwrap_err();
        assert_eq!(overflow.kind(), ErrorKind::Config);

        // Fits in usize with the overhead added, but no allocation can hold it.
        let huge = usize::MAX - 100;
        let too_large = CypherBuilder::from_passphrase("k").chunk_size(huge).num_workers(1).build().unwrap_err();
        assert!(matches!(
            too_large,
            StreamError::Config(ConfigError::ChunkSizeOverflow { chunk_size }) if chunk_size == huge
        ));

        let short_key = CypherBuilder::from_key_bytes(&[0u8; 16]).unwrap_err();
        assert_eq!(short_key, ConfigError::InvalidKeyLen { expected: 32, actual: 16 });
    }

    #[test]
    fn default_cypher_roundtrip() {
        let c = Cypher::new("defaults").unwrap();
        let data = pattern(1000);
        assert_eq!(c.decrypt(&c.encrypt(&data).unwrap()).unwrap(), data);
    }

    // ------------------------------------------------------------
    // Files
    // ------------------------------------------------------------
    #[test]
    fn file_roundtrip_uses_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.bin");
        let data = pattern(10 * CHUNK + 3);
        fs::write(&input, &data).unwrap();

        let c = cypher("files");
        let encrypted = c.encrypt_file(&input).unwrap();
        assert_eq!(encrypted, dir.path().join(format!("report.bin{ENCRYPTED_SUFFIX}")));
        assert_eq!(fs::metadata(&encrypted).unwrap().len(), c.encrypted_len(data.len() as u64));

        let decrypted = c.decrypt_file(&encrypted).unwrap();
        assert_eq!(decrypted, dir.path().join(format!("report.bin{ENCRYPTED_SUFFIX}{DECRYPTED_SUFFIX}")));
        assert_eq!(fs::read(&decrypted).unwrap(), data);
        assert_eq!(md5_hex_from_file(&input).unwrap(), md5_hex_from_file(&decrypted).unwrap());
    }

    #[test]
    fn file_and_buffer_formats_match() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain");
        let data = pattern(3 * CHUNK);
        fs::write(&input, &data).unwrap();

        let c = cypher("formats");
        let encrypted = c.encrypt_file(&input).unwrap();
        let sealed = fs::read(encrypted).unwrap();
        assert_eq!(c.decrypt(&sealed).unwrap(), data);
    }

    #[test]
    fn missing_input_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent");

        let err = cypher("missing").encrypt_file(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!dir.path().join(format!("absent{ENCRYPTED_SUFFIX}")).exists());

        let err = cypher("missing").decrypt_file(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!dir.path().join(format!("absent{DECRYPTED_SUFFIX}")).exists());
    }

    #[test]
    fn decrypt_file_with_wrong_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("secret");
        fs::write(&input, pattern(4 * CHUNK)).unwrap();

        let encrypted = cypher("alice").encrypt_file(&input).unwrap();
        let err = cypher("mallory").decrypt_file(&encrypted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn empty_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        fs::write(&input, b"").unwrap();

        let c = cypher("empty-file");
        let encrypted = c.encrypt_file(&input).unwrap();
        assert_eq!(fs::metadata(&encrypted).unwrap().len(), 0);
        let decrypted = c.decrypt_file(&encrypted).unwrap();
        assert!(fs::read(decrypted).unwrap().is_empty());
    }

    // ------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------
    #[test]
    fn stream_api_memory_sink_roundtrip() {
        let c = cypher("stream");
        let data = pattern(5 * CHUNK + 9);

        let enc = c.encrypt_stream(InputSource::Memory(data.clone()), OutputSink::Memory, None).unwrap();
        assert_eq!(enc.chunks, 6);
        assert_eq!(enc.bytes_in, data.len() as u64);
        let sealed = enc.output.clone().unwrap();
        assert_eq!(enc.bytes_out, sealed.len() as u64);

        let dec = c.decrypt_stream(InputSource::Memory(sealed), OutputSink::Memory, None).unwrap();
        assert_eq!(dec.output.unwrap(), data);
    }

    #[test]
    fn stream_api_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sealed");
        let c = cypher("stream-file");
        let data = pattern(2 * CHUNK);

        let snapshot = c.encrypt_stream(InputSource::Memory(data.clone()), OutputSink::File(out.clone()), None).unwrap();
        assert!(snapshot.output.is_none());
        assert_eq!(c.decrypt(&fs::read(out).unwrap()).unwrap(), data);
    }

    // ------------------------------------------------------------
    // Concurrency
    // ------------------------------------------------------------
    #[test]
    fn shared_cypher_runs_concurrently() {
        let c = Arc::new(cypher("shared"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    let data = pattern(i * CHUNK + i);
                    let sealed = c.encrypt(&data).unwrap();
                    assert_eq!(c.decrypt(&sealed).unwrap(), data);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
