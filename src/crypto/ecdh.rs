// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Generation and Agreement
//!
//! Generates endpoint key pairs on NIST P-256 (secp256r1), the curve
//! existing peers use, and performs the single agreement phase that turns a
//! peer's public key into the shared secret.
//!
//! The shared secret is the raw x-coordinate of the ECDH point. No KDF is
//! applied: the cipher is keyed with these bytes directly, which keeps the
//! payload format compatible with existing peers.

use std::fmt;
use std::str::FromStr;

use p256::elliptic_curve::subtle::ConstantTimeEq;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::{CryptoError, CryptoResult};

/// Nominal curve strength requested at generation time
///
/// `Size128` resolves to a 256-bit curve. This mirrors the deployed
/// enumeration and is kept as observed until the owner decides whether it
/// is a defect; see [`KeySize::bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    Size128,
    Size192,
    #[default]
    Size256,
    Size512,
}

impl KeySize {
    pub const ALL: [KeySize; 4] = [
        KeySize::Size128,
        KeySize::Size192,
        KeySize::Size256,
        KeySize::Size512,
    ];

    /// The strength this entry is named after
    pub fn nominal_bits(self) -> u32 {
        match self {
            KeySize::Size128 => 128,
            KeySize::Size192 => 192,
            KeySize::Size256 => 256,
            KeySize::Size512 => 512,
        }
    }

    /// The strength actually requested from the provider
    pub fn bits(self) -> u32 {
        match self {
            // Observed mapping, not a typo in this table
            KeySize::Size128 => 256,
            KeySize::Size192 => 192,
            KeySize::Size256 => 256,
            KeySize::Size512 => 512,
        }
    }

    /// Curve backing this size, if the provider has one
    pub fn curve(self) -> Option<Curve> {
        match self.bits() {
            256 => Some(Curve::P256),
            _ => None,
        }
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.nominal_bits())
    }
}

impl TryFrom<u32> for KeySize {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        KeySize::ALL
            .into_iter()
            .find(|s| s.nominal_bits() == bits)
            .ok_or_else(|| format!("unsupported key size: {} (expected 128, 192, 256 or 512)", bits))
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> Self {
        size.nominal_bits()
    }
}

impl FromStr for KeySize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_suffix("-bit").unwrap_or(s);
        let bits: u32 = digits
            .parse()
            .map_err(|_| format!("invalid key size: {:?}", s))?;
        KeySize::try_from(bits)
    }
}

/// Curves available to the key generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 / secp256r1 / prime256v1
    P256,
}

impl Curve {
    pub fn name(self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw ECDH shared secret
///
/// Zeroized on drop. Comparison is constant time.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret([REDACTED; {}])", self.len())
    }
}

/// Single-use Diffie-Hellman agreement bound to a private key
///
/// [`KeyAgreement::complete`] consumes the handle, so one handle can never
/// produce two secrets.
pub struct KeyAgreement {
    private_key: SecretKey,
}

impl KeyAgreement {
    pub fn new(private_key: &SecretKey) -> Self {
        Self {
            private_key: private_key.clone(),
        }
    }

    /// Run the final phase against the peer's public key
    pub fn complete(self, peer: &PublicKey) -> SharedSecret {
        let shared = p256::ecdh::diffie_hellman(
            self.private_key.to_nonzero_scalar(),
            peer.as_affine(),
        );
        SharedSecret::from_bytes(shared.raw_secret_bytes())
    }
}

impl fmt::Debug for KeyAgreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAgreement").finish_non_exhaustive()
    }
}

/// Output of [`generate`]
pub struct GeneratedKeys {
    pub public_key: PublicKey,
    pub private_key: SecretKey,
    pub agreement: KeyAgreement,
}

/// Generate a fresh key pair and its agreement handle
///
/// # Errors
///
/// `KeyGeneration` if no curve of the requested strength is available.
pub fn generate(size: KeySize) -> CryptoResult<GeneratedKeys> {
    let curve = size.curve().ok_or_else(|| CryptoError::KeyGeneration {
        key_size: size.to_string(),
        reason: format!("no EC curve with {} bits is available", size.bits()),
    })?;

    match curve {
        Curve::P256 => {
            let private_key = SecretKey::random(&mut OsRng);
            let public_key = private_key.public_key();
            let agreement = KeyAgreement::new(&private_key);
            Ok(GeneratedKeys {
                public_key,
                private_key,
                agreement,
            })
        }
    }
}

/// Complete `agreement` against `peer` and return the shared secret bytes
pub fn derive_shared_secret(agreement: KeyAgreement, peer: &PublicKey) -> SharedSecret {
    agreement.complete(peer)
}
