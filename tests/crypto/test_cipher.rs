// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Symmetric cipher tests over both payload formats

use std::sync::Arc;

use fabstir_endpoint_crypto::crypto::{CipherErrorKind, CipherFormat, SymmetricCipher};
use fabstir_endpoint_crypto::logging::{LogLevel, MemorySink};
use rand::{rngs::OsRng, Rng, RngCore};

fn cipher(format: CipherFormat) -> (SymmetricCipher, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (SymmetricCipher::new(format, sink.clone()), sink)
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

#[test]
fn test_roundtrip_payload_lengths() {
    let key = random_bytes(32);
    let mut rng = rand::thread_rng();
    let mut lengths = vec![0, 1, 15, 16, 17, 31, 32, 33, 1000, 10_000];
    lengths.extend((0..20).map(|_| rng.gen_range(0..=10_000)));

    for format in [CipherFormat::Legacy, CipherFormat::AesGcm] {
        let (cipher, sink) = cipher(format);
        for &len in &lengths {
            let plaintext = random_bytes(len);
            let ciphertext = cipher.encrypt(&key, &plaintext);
            assert_eq!(
                cipher.decrypt(&key, &ciphertext),
                plaintext,
                "{} round trip failed for {} bytes",
                format,
                len
            );
        }
        assert!(sink.is_empty(), "no failures expected: {:?}", sink.records());
    }
}

#[test]
fn test_legacy_output_is_unpadded_base64() {
    let (cipher, _) = cipher(CipherFormat::Legacy);
    let key = [3u8; 16];

    // 16 bytes of plaintext pad to 32 bytes of ciphertext: 43 base64 chars, no '='
    let ciphertext = cipher.try_encrypt(&key, &[0u8; 16]).unwrap();
    assert_eq!(ciphertext.len(), 43);
    assert!(!ciphertext.contains(&b'='));
    assert!(ciphertext
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/'));
}

#[test]
fn test_legacy_is_deterministic() {
    let (cipher, _) = cipher(CipherFormat::Legacy);
    let key = [9u8; 32];
    assert_eq!(
        cipher.encrypt(&key, b"same input"),
        cipher.encrypt(&key, b"same input")
    );
}

#[test]
fn test_mismatched_key_never_yields_plaintext() {
    let plaintext = b"attack at dawn, bring snacks".to_vec();

    for format in [CipherFormat::Legacy, CipherFormat::AesGcm] {
        for _ in 0..8 {
            let (cipher, sink) = cipher(format);
            let ciphertext = cipher.encrypt(&random_bytes(32), &plaintext);

            let output = cipher.decrypt(&random_bytes(32), &ciphertext);
            assert_ne!(output, plaintext);
            if output == ciphertext {
                let records = sink.records();
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].level, LogLevel::Error);
                assert!(records[0].message.starts_with("Error decrypting"));
            }
        }
    }
}

#[test]
fn test_aes_gcm_wrong_key_is_reported_as_wrong_key() {
    let (cipher, sink) = cipher(CipherFormat::AesGcm);
    let ciphertext = cipher.try_encrypt(&[1u8; 32], b"secret").unwrap();

    let err = cipher.try_decrypt(&[2u8; 32], &ciphertext).unwrap_err();
    assert_eq!(err.cipher_kind(), Some(CipherErrorKind::WrongKey));

    assert_eq!(cipher.decrypt(&[2u8; 32], &ciphertext), ciphertext);
    assert!(sink.contains(LogLevel::Error, "wrong key"));
}

#[test]
fn test_garbage_ciphertext_is_a_decrypt_error() {
    let (cipher, sink) = cipher(CipherFormat::Legacy);
    let key = [5u8; 32];

    for garbage in [&b"!!! not base64 !!!"[..], &b"QUJD"[..], &b""[..]] {
        let err = cipher.try_decrypt(&key, garbage).unwrap_err();
        assert_eq!(err.cipher_kind(), Some(CipherErrorKind::Decrypt));
        assert_eq!(cipher.decrypt(&key, garbage), garbage);
    }
    assert!(sink.contains(LogLevel::Error, "Error decrypting"));
}

#[test]
fn test_bad_key_length_fails_open_on_encrypt() {
    let (cipher, sink) = cipher(CipherFormat::Legacy);

    assert_eq!(cipher.encrypt(&[0u8; 7], b"plaintext"), b"plaintext");
    assert!(sink.contains(LogLevel::Warn, "Invalid key"));

    let err = cipher.try_encrypt(&[0u8; 7], b"plaintext").unwrap_err();
    assert_eq!(err.cipher_kind(), Some(CipherErrorKind::Encrypt));
}

#[test]
fn test_formats_are_not_interchangeable() {
    let key = [4u8; 32];
    let (legacy, _) = cipher(CipherFormat::Legacy);
    let (gcm, _) = cipher(CipherFormat::AesGcm);

    let ciphertext = gcm.try_encrypt(&key, b"versioned").unwrap();
    assert!(legacy
        .try_decrypt(&key, &ciphertext)
        .map(|pt| pt != b"versioned")
        .unwrap_or(true));
}
