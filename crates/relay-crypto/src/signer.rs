use std::fmt;

use ed25519_dalek::Signer as _;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CryptoError, CryptoResult};

pub const SECRET_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// Private half of an account's Ed25519 credential.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

/// Public half of an account's Ed25519 credential.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// Detached Ed25519 signature, carried on the wire as 64 raw bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl SigningKey {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draw a key from `rng`. Tests pass a seeded `StdRng` for stable fixtures.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(rng),
        }
    }

    pub fn from_bytes(secret: [u8; SECRET_KEY_LEN]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&secret),
        }
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.inner.to_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

impl VerifyingKey {
    /// Fails on byte strings that are not a valid curve point.
    pub fn from_bytes(public: [u8; PUBLIC_KEY_LEN]) -> CryptoResult<Self> {
        ed25519_dalek::VerifyingKey::from_bytes(&public)
            .map(|inner| Self { inner })
            .map_err(|_| CryptoError::InvalidKey)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.inner.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Strict verification: rejects weak keys and malleable signatures.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.inner
            .verify_strict(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<u8>::deserialize(deserializer)?;
        let len = raw.len();
        raw.try_into().map(Signature).map_err(|_| {
            serde::de::Error::invalid_length(len, &"a 64-byte ed25519 signature")
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl fmt::Display for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey({self})")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..6]))
    }
}
