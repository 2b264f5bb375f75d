// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key codec and endpoint record tests

use std::sync::Arc;

use fabstir_endpoint_crypto::crypto::{
    decode_key, deserialize_endpoint, encode_key, serialize_endpoint, CipherFormat, CryptoError,
    Encryption, EndpointFactory, KeyCodec, KeySize, PersistedEndpointRecord, NULL_SENTINEL,
};
use fabstir_endpoint_crypto::logging::{LogLevel, MemorySink};

// P-256 key pairs and their agreement, produced independently with openssl
const ALICE_PUBLIC: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEmKzIBNxHrG3RqE2lIUAF6BCZKwtjs/7XmjERlL/Ra08RhLbGXwswB6mTmqRpAdsSCx377rTtrkCjeuePTQURrA==";
const ALICE_PRIVATE: &str = "MIGHAgEAMBMGByqGSM49AgEGCCqGSM49AwEHBG0wawIBAQQgIxtv+zkIWtaoKCEnp9HS+wIq/S676oEpS3Ts7M1LAMihRANCAASYrMgE3EesbdGoTaUhQAXoEJkrC2Oz/teaMRGUv9FrTxGEtsZfCzAHqZOapGkB2xILHfvutO2uQKN6549NBRGs";
const BOB_PUBLIC: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE1aahgc9yfToIJ1JRjQwc1pftdbW3hLB33WPxNhrujEb6K5QboRjOjtWgEyMEHEnE/BHwhI0l2HdPI6M22gsNgA==";
const BOB_PRIVATE: &str = "MIGHAgEAMBMGByqGSM49AgEGCCqGSM49AwEHBG0wawIBAQQg4pntPZ2Uw6TKWiQ+EpdD8q4RSEHh9IOrk0H+H8z6sbuhRANCAATVpqGBz3J9OggnUlGNDBzWl+11tbeEsHfdY/E2Gu6MRvorlBuhGM6O1aATIwQcScT8EfCEjSXYd08jozbaCw2A";
const AGREED_SECRET_HEX: &str = "97fe159ffcd3fbece752b8b69c879f9368dba53f83fa3f2a8c018fe252889b12";
const HELLO_WORLD_CIPHERTEXT: &[u8] = b"uthH+FtgLKVJXVA7zeFHCQ";

fn factory() -> EndpointFactory {
    EndpointFactory::new(
        KeySize::Size256,
        CipherFormat::Legacy,
        Arc::new(MemorySink::new()),
    )
}

#[test]
fn test_key_text_roundtrip() {
    for raw in [&[][..], &[0u8][..], &[0xFF; 33][..], &[1, 2, 3, 250, 251, 252, 253][..]] {
        let text = encode_key(raw);
        assert_eq!(decode_key(&text).unwrap(), raw);
    }
}

#[test]
fn test_decode_accepts_padded_input() {
    assert_eq!(decode_key("AAEC+vv8/Q==").unwrap(), vec![0, 1, 2, 250, 251, 252, 253]);
    assert_eq!(decode_key("AAEC+vv8/Q").unwrap(), vec![0, 1, 2, 250, 251, 252, 253]);
    assert!(matches!(
        decode_key("not base64!"),
        Err(CryptoError::KeyDecode { .. })
    ));
}

#[test]
fn test_reconstruct_keys_from_endpoint() {
    let sink = Arc::new(MemorySink::new());
    let codec = KeyCodec::new(sink.clone());
    let endpoint = factory().create();

    let public_der = endpoint.encoded_public_key().unwrap();
    let public = codec.reconstruct_public_key(&public_der).unwrap();
    assert_eq!(&public, endpoint.public_key().unwrap());
    assert!(sink.is_empty());

    assert!(codec.reconstruct_public_key(b"garbage").is_none());
    assert!(sink.contains(LogLevel::Warn, "Error retrieving public key"));

    assert!(codec.reconstruct_private_key(&public_der).is_none());
    assert!(sink.contains(LogLevel::Warn, "Error retrieving private key"));
}

#[test]
fn test_record_roundtrip_without_secret() {
    let factory = factory();
    let endpoint = factory.create();

    let record = serialize_endpoint(&endpoint).unwrap();
    assert_eq!(record.shared.as_deref(), Some(NULL_SENTINEL));

    let restored = deserialize_endpoint(&record, &factory).unwrap();
    assert_eq!(restored.public_key(), endpoint.public_key());
    assert!(restored.shared_secret().is_none());
    assert!(!restored.is_usable());
    assert_eq!(serialize_endpoint(&restored).unwrap(), record);
}

#[test]
fn test_record_roundtrip_with_secret() {
    let factory = factory();
    let mut a = factory.create();
    let mut b = factory.create();
    let a_pub = a.public_key().cloned().unwrap();
    let b_pub = b.public_key().cloned().unwrap();
    a.derive_shared_secret(&b_pub).unwrap();
    b.derive_shared_secret(&a_pub).unwrap();

    let record = serialize_endpoint(&a).unwrap();
    assert!(record.has_shared_secret());

    let restored = deserialize_endpoint(&record, &factory).unwrap();
    assert_eq!(restored.public_key(), a.public_key());
    assert_eq!(restored.shared_secret(), a.shared_secret());
    assert!(restored.is_usable());

    // The restored endpoint talks to the original peer
    let ciphertext = restored.encrypt(b"after restart");
    assert_eq!(b.decrypt(&ciphertext), b"after restart");
}

#[test]
fn test_restored_secret_cannot_be_rederived() {
    let factory = factory();
    let mut a = factory.create();
    let b = factory.create();
    a.derive_shared_secret(b.public_key().unwrap()).unwrap();

    let mut restored = deserialize_endpoint(&serialize_endpoint(&a).unwrap(), &factory).unwrap();
    assert!(matches!(
        restored.derive_shared_secret(b.public_key().unwrap()),
        Err(CryptoError::KeyAgreement { .. })
    ));
}

#[test]
fn test_restored_endpoint_without_secret_can_still_derive() {
    let factory = factory();
    let a = factory.create();
    let b = factory.create();

    let mut restored = deserialize_endpoint(&serialize_endpoint(&a).unwrap(), &factory).unwrap();
    restored.derive_shared_secret(b.public_key().unwrap()).unwrap();
    assert!(restored.is_usable());
}

#[test]
fn test_load_without_private_key_is_invalid() {
    let factory = factory();
    let mut a = factory.create();
    let b = factory.create();
    a.derive_shared_secret(b.public_key().unwrap()).unwrap();

    let public = a.encoded_public_key().unwrap();
    let shared = a.shared_secret().unwrap().as_bytes().to_vec();
    let result = factory.load(Some(public.as_slice()), None, Some(shared.as_slice()));
    assert!(matches!(result, Err(CryptoError::InvalidEncryption(_))));

    let result = factory.load(None, None, None);
    assert!(matches!(result, Err(CryptoError::InvalidEncryption(_))));
}

#[test]
fn test_load_rejects_mismatched_key_pair() {
    let factory = factory();
    let a = serialize_endpoint(&factory.create()).unwrap();
    let b = serialize_endpoint(&factory.create()).unwrap();

    let spliced = PersistedEndpointRecord {
        public: a.public.clone(),
        private: b.private.clone(),
        shared: Some(NULL_SENTINEL.to_string()),
    };
    assert!(matches!(
        deserialize_endpoint(&spliced, &factory),
        Err(CryptoError::InvalidEncryption(_))
    ));
}

#[test]
fn test_deserialize_rejects_malformed_records() {
    let factory = factory();
    let good = serialize_endpoint(&factory.create()).unwrap();

    let cases = [
        PersistedEndpointRecord {
            public: Some("@@@".to_string()),
            ..good.clone()
        },
        PersistedEndpointRecord {
            private: Some(encode_key(b"not pkcs8")),
            ..good.clone()
        },
        PersistedEndpointRecord {
            shared: Some("%%%".to_string()),
            ..good.clone()
        },
        PersistedEndpointRecord {
            shared: None,
            ..good.clone()
        },
        PersistedEndpointRecord {
            public: None,
            ..good.clone()
        },
    ];

    for record in &cases {
        assert!(
            matches!(
                deserialize_endpoint(record, &factory),
                Err(CryptoError::InvalidEncryption(_))
            ),
            "expected rejection for {:?}",
            record
        );
    }
}

#[test]
fn test_record_json_shape() {
    let factory = factory();
    let record = serialize_endpoint(&factory.create()).unwrap();
    let json: serde_json::Value = serde_json::to_value(&record).unwrap();

    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert_eq!(object["shared"], "null");
    assert!(object["public"].is_string());
    assert!(object["private"].is_string());

    let parsed: PersistedEndpointRecord = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_loads_p256_record_and_agrees_with_known_secret() {
    let factory = factory();
    let record = PersistedEndpointRecord {
        public: Some(ALICE_PUBLIC.to_string()),
        private: Some(ALICE_PRIVATE.to_string()),
        shared: Some(NULL_SENTINEL.to_string()),
    };

    let mut alice = deserialize_endpoint(&record, &factory).unwrap();
    let bob_public = decode_key(BOB_PUBLIC).unwrap();
    alice
        .derive_shared_secret_from_encoded(&bob_public, factory.codec())
        .unwrap();

    let secret = alice.shared_secret().unwrap();
    assert_eq!(hex::encode(secret.as_bytes()), AGREED_SECRET_HEX);
    assert_eq!(alice.encrypt(b"hello world"), HELLO_WORLD_CIPHERTEXT);
    assert_eq!(alice.decrypt(HELLO_WORLD_CIPHERTEXT), b"hello world");
}

#[test]
fn test_loads_p256_record_with_stored_secret() {
    let factory = factory();
    let secret = hex::decode(AGREED_SECRET_HEX).unwrap();
    let record = PersistedEndpointRecord {
        public: Some(BOB_PUBLIC.to_string()),
        private: Some(BOB_PRIVATE.to_string()),
        shared: Some(encode_key(&secret)),
    };

    let bob = deserialize_endpoint(&record, &factory).unwrap();
    assert!(bob.is_usable());
    assert_eq!(bob.decrypt(HELLO_WORLD_CIPHERTEXT), b"hello world");

    // The stored fixture survives a serialize round trip byte for byte
    let again = serialize_endpoint(&bob).unwrap();
    assert_eq!(again.public.as_deref(), Some(BOB_PUBLIC));
    assert_eq!(again.shared, record.shared);
}

#[test]
fn test_stored_secret_of_unusable_length_is_invalid() {
    let factory = factory();
    let record = PersistedEndpointRecord {
        public: Some(BOB_PUBLIC.to_string()),
        private: Some(BOB_PRIVATE.to_string()),
        shared: Some(encode_key(&[1, 2, 3, 4, 5])),
    };
    assert!(matches!(
        deserialize_endpoint(&record, &factory),
        Err(CryptoError::InvalidEncryption(_))
    ));
}
