//! Twisted ElGamal over Ristretto255.
//!
//! The decryption key is a scalar `s`; the encryption key is the point
//! `P = (1/s)·H`. A ciphertext of `m` under `P` with randomness `r` is
//!
//! ```text
//! C = m·G + r·H        D = r·P
//! ```
//!
//! so `C − s·D = m·G` and decryption reduces to a bounded discrete-log
//! search in the exponent of `G`. Ciphertexts are additively homomorphic,
//! component-wise, and a plaintext scalar can be added by shifting `C`.

use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;
use zeroize::Zeroize;

use crate::dlog;
use crate::ristretto::{point_from_bytes, random_scalar, scalar_from_bytes, G, H};

pub const RISTRETTO_COMPRESSED_SIZE: usize = 32;
pub const SCALAR_SIZE: usize = 32;
pub const CIPHERTEXT_SIZE: usize = 64;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressionError {
    #[error("invalid point encoding")]
    InvalidPoint,
    #[error("scalar encoding is not canonical")]
    NonCanonicalScalar,
    #[error("scalar is zero")]
    ZeroScalar,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("no amount located in [{lo}, {hi})")]
    OutOfRange { lo: u64, hi: u64 },
    #[error("recombined chunks exceed 128 bits")]
    BalanceOverflow,
}

/// The secret scalar `s`.
#[derive(Clone, Zeroize)]
pub struct DecryptionKey(Scalar);

/// The public point `P = (1/s)·H`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey(RistrettoPoint);

#[derive(Clone)]
pub struct Keypair {
    encryption_key: EncryptionKey,
    decryption_key: DecryptionKey,
}

impl DecryptionKey {
    /// Sample a fresh nonzero decryption key.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let scalar = random_scalar(rng);
            if scalar != Scalar::ZERO {
                return Self(scalar);
            }
        }
    }

    pub fn from_scalar(scalar: Scalar) -> Result<Self, DecompressionError> {
        if scalar == Scalar::ZERO {
            return Err(DecompressionError::ZeroScalar);
        }
        Ok(Self(scalar))
    }

    pub fn from_bytes(bytes: &[u8; SCALAR_SIZE]) -> Result<Self, DecompressionError> {
        let scalar = scalar_from_bytes(bytes).ok_or(DecompressionError::NonCanonicalScalar)?;
        Self::from_scalar(scalar)
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_SIZE] {
        self.0.to_bytes()
    }

    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// `s⁻¹ mod ℓ`, the discrete log of the encryption key base `H`.
    pub fn inverted(&self) -> Scalar {
        self.0.invert()
    }

    /// Derive the matching encryption key `P = (1/s)·H`.
    pub fn encryption_key(&self) -> EncryptionKey {
        EncryptionKey(self.0.invert() * *H)
    }

    /// `C − s·D`, the plaintext in the exponent of `G`.
    pub fn decrypt_to_point(&self, ciphertext: &Ciphertext) -> RistrettoPoint {
        ciphertext.C - self.0 * ciphertext.D
    }

    /// Recover the plaintext by bounded discrete-log search over `window`.
    pub fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        window: Range<u64>,
    ) -> Result<u64, DecryptionError> {
        let point = self.decrypt_to_point(ciphertext);
        dlog::recover(&point, window.clone()).ok_or(DecryptionError::OutOfRange {
            lo: window.start,
            hi: window.end,
        })
    }
}

impl EncryptionKey {
    pub fn from_point(point: RistrettoPoint) -> Self {
        Self(point)
    }

    pub fn from_bytes(bytes: &[u8; RISTRETTO_COMPRESSED_SIZE]) -> Result<Self, DecompressionError> {
        point_from_bytes(bytes)
            .map(Self)
            .ok_or(DecompressionError::InvalidPoint)
    }

    pub fn to_bytes(&self) -> [u8; RISTRETTO_COMPRESSED_SIZE] {
        self.0.compress().to_bytes()
    }

    pub fn as_point(&self) -> &RistrettoPoint {
        &self.0
    }

    /// Encrypt `amount` with caller-supplied randomness.
    pub fn encrypt_with(&self, amount: u64, randomness: &Scalar) -> Ciphertext {
        Ciphertext {
            C: Scalar::from(amount) * *G + randomness * *H,
            D: randomness * self.0,
        }
    }

    /// Encrypt `amount` with fresh randomness; returns the randomness so the
    /// caller can build the proofs that reference it.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        amount: u64,
        rng: &mut R,
    ) -> (Ciphertext, Scalar) {
        let randomness = random_scalar(rng);
        (self.encrypt_with(amount, &randomness), randomness)
    }
}

impl Keypair {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_decryption_key(DecryptionKey::random(rng))
    }

    /// Deterministic keypair from a 32-byte seed; used for reproducible
    /// fixtures, not for production keys.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(b"AptosVeiledCoin/KeypairSeed");
        hasher.update(seed);
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&hasher.finalize());
        let mut scalar = Scalar::from_bytes_mod_order_wide(&wide);
        if scalar == Scalar::ZERO {
            scalar = Scalar::ONE;
        }
        Self::from_decryption_key(DecryptionKey(scalar))
    }

    pub fn from_decryption_key(decryption_key: DecryptionKey) -> Self {
        Self {
            encryption_key: decryption_key.encryption_key(),
            decryption_key,
        }
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption_key
    }

    pub fn decryption_key(&self) -> &DecryptionKey {
        &self.decryption_key
    }
}

/// A twisted ElGamal ciphertext pair.
#[allow(non_snake_case)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub C: RistrettoPoint,
    pub D: RistrettoPoint,
}

impl Ciphertext {
    /// Encryption of zero with zero randomness; the homomorphic identity.
    pub fn zero() -> Self {
        use curve25519_dalek::traits::Identity;
        Self {
            C: RistrettoPoint::identity(),
            D: RistrettoPoint::identity(),
        }
    }

    /// Shift the plaintext by `amount` without touching the randomness.
    pub fn add_amount(&self, amount: u64) -> Self {
        Self {
            C: self.C + Scalar::from(amount) * *G,
            D: self.D,
        }
    }

    pub fn sub_amount(&self, amount: u64) -> Self {
        Self {
            C: self.C - Scalar::from(amount) * *G,
            D: self.D,
        }
    }

    /// `C ‖ D`, both compressed.
    pub fn to_bytes(&self) -> [u8; CIPHERTEXT_SIZE] {
        let mut bytes = [0u8; CIPHERTEXT_SIZE];
        bytes[..32].copy_from_slice(&self.C.compress().to_bytes());
        bytes[32..].copy_from_slice(&self.D.compress().to_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; CIPHERTEXT_SIZE]) -> Result<Self, DecompressionError> {
        let mut c = [0u8; 32];
        let mut d = [0u8; 32];
        c.copy_from_slice(&bytes[..32]);
        d.copy_from_slice(&bytes[32..]);
        Ok(Self {
            C: point_from_bytes(&c).ok_or(DecompressionError::InvalidPoint)?,
            D: point_from_bytes(&d).ok_or(DecompressionError::InvalidPoint)?,
        })
    }
}

impl Add for Ciphertext {
    type Output = Ciphertext;

    fn add(self, other: Ciphertext) -> Ciphertext {
        Ciphertext {
            C: self.C + other.C,
            D: self.D + other.D,
        }
    }
}

impl AddAssign for Ciphertext {
    fn add_assign(&mut self, other: Ciphertext) {
        *self = *self + other;
    }
}

impl Sub for Ciphertext {
    type Output = Ciphertext;

    fn sub(self, other: Ciphertext) -> Ciphertext {
        Ciphertext {
            C: self.C - other.C,
            D: self.D - other.D,
        }
    }
}

impl SubAssign for Ciphertext {
    fn sub_assign(&mut self, other: Ciphertext) {
        *self = *self - other;
    }
}
