//! Chunked balance representation.
//!
//! A 128-bit balance is split into four 32-bit chunks,
//! `v = Σᵢ cᵢ·2^{32·i}`, and each chunk is encrypted independently. This
//! keeps the bounded discrete-log decryption and the per-chunk range proofs
//! small. Homomorphic additions on-chain can overflow a chunk into
//! `[0, 2^64)`; a balance is *normalized* when every chunk is back under
//! 2^32, which is what the normalization proof re-establishes.

use std::ops::Range;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::elgamal::{
    Ciphertext, DecompressionError, DecryptionError, DecryptionKey, EncryptionKey, CIPHERTEXT_SIZE,
};

pub const CHUNK_BITS: usize = 32;
pub const CHUNK_COUNT: usize = 4;

/// Decryption window of a normalized chunk.
pub const CHUNK_WINDOW: Range<u64> = 0..1 << CHUNK_BITS;

/// The positional weight `2^{32·i}` as a scalar.
pub fn chunk_weight(i: usize) -> Scalar {
    Scalar::from(1u128 << (CHUNK_BITS * i))
}

/// Split a 128-bit balance into normalized chunks.
pub fn split_balance(value: u128) -> [u64; CHUNK_COUNT] {
    let mask = (1u128 << CHUNK_BITS) - 1;
    core::array::from_fn(|i| ((value >> (CHUNK_BITS * i)) & mask) as u64)
}

/// Split a 64-bit amount; the upper two chunks are always zero.
pub fn split_amount(amount: u64) -> [u64; CHUNK_COUNT] {
    split_balance(amount as u128)
}

/// Recombine chunks by positional weighting. `None` when an unnormalized
/// chunk vector overflows 128 bits.
pub fn combine_chunks(chunks: &[u64; CHUNK_COUNT]) -> Option<u128> {
    chunks.iter().enumerate().try_fold(0u128, |acc, (i, &c)| {
        let weighted = (c as u128).checked_mul(1u128 << (CHUNK_BITS * i))?;
        acc.checked_add(weighted)
    })
}

pub fn is_normalized(chunks: &[u64; CHUNK_COUNT]) -> bool {
    chunks.iter().all(|&c| c < 1 << CHUNK_BITS)
}

/// A balance ciphertext vector: one twisted ElGamal ciphertext per chunk,
/// each with independent randomness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBalance(pub [Ciphertext; CHUNK_COUNT]);

impl EncryptedBalance {
    pub fn encrypt_with(
        key: &EncryptionKey,
        chunks: &[u64; CHUNK_COUNT],
        randomness: &[Scalar; CHUNK_COUNT],
    ) -> Self {
        Self(core::array::from_fn(|i| {
            key.encrypt_with(chunks[i], &randomness[i])
        }))
    }

    /// Decrypt every chunk over the same window.
    pub fn decrypt_chunks(
        &self,
        key: &DecryptionKey,
        window: Range<u64>,
    ) -> Result<[u64; CHUNK_COUNT], DecryptionError> {
        let mut chunks = [0u64; CHUNK_COUNT];
        for (chunk, ciphertext) in chunks.iter_mut().zip(self.0.iter()) {
            *chunk = key.decrypt(ciphertext, window.clone())?;
        }
        Ok(chunks)
    }

    /// Decrypt and recombine the balance.
    pub fn decrypt(
        &self,
        key: &DecryptionKey,
        window: Range<u64>,
    ) -> Result<u128, DecryptionError> {
        let chunks = self.decrypt_chunks(key, window)?;
        combine_chunks(&chunks).ok_or(DecryptionError::BalanceOverflow)
    }

    /// `Σᵢ 2^{32·i}·Cᵢ`
    pub fn aggregate_c(&self) -> RistrettoPoint {
        self.0
            .iter()
            .enumerate()
            .map(|(i, ct)| ct.C * chunk_weight(i))
            .sum()
    }

    /// `Σᵢ 2^{32·i}·Dᵢ`
    pub fn aggregate_d(&self) -> RistrettoPoint {
        self.0
            .iter()
            .enumerate()
            .map(|(i, ct)| ct.D * chunk_weight(i))
            .sum()
    }

    pub fn to_bytes(&self) -> [u8; CIPHERTEXT_SIZE * CHUNK_COUNT] {
        let mut bytes = [0u8; CIPHERTEXT_SIZE * CHUNK_COUNT];
        for (i, ciphertext) in self.0.iter().enumerate() {
            bytes[i * CIPHERTEXT_SIZE..(i + 1) * CIPHERTEXT_SIZE]
                .copy_from_slice(&ciphertext.to_bytes());
        }
        bytes
    }

    pub fn from_bytes(
        bytes: &[u8; CIPHERTEXT_SIZE * CHUNK_COUNT],
    ) -> Result<Self, DecompressionError> {
        let mut ciphertexts = [Ciphertext::zero(); CHUNK_COUNT];
        for (i, ciphertext) in ciphertexts.iter_mut().enumerate() {
            let mut chunk = [0u8; CIPHERTEXT_SIZE];
            chunk.copy_from_slice(&bytes[i * CIPHERTEXT_SIZE..(i + 1) * CIPHERTEXT_SIZE]);
            *ciphertext = Ciphertext::from_bytes(&chunk)?;
        }
        Ok(Self(ciphertexts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::Keypair;
    use crate::ristretto::{random_scalar, G};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn randomness(seed: u8) -> [Scalar; CHUNK_COUNT] {
        let mut rng = ChaCha20Rng::from_seed([seed; 32]);
        core::array::from_fn(|_| random_scalar(&mut rng))
    }

    #[test]
    fn split_combine_roundtrip() {
        for v in [0u128, 70, 1 << 32, (1 << 64) + 100, u128::MAX] {
            assert_eq!(combine_chunks(&split_balance(v)), Some(v));
        }
    }

    #[test]
    fn split_amount_keeps_upper_chunks_zero() {
        let chunks = split_amount(u64::MAX);
        assert_eq!(chunks[2], 0);
        assert_eq!(chunks[3], 0);
        assert_eq!(combine_chunks(&chunks), Some(u64::MAX as u128));
    }

    #[test]
    fn unnormalized_chunks_recombine() {
        let chunks = [(1u64 << 32) + 100, (1 << 32) + 200, (1 << 32) + 300, 0];
        assert!(!is_normalized(&chunks));
        let v = combine_chunks(&chunks).unwrap();
        assert!(is_normalized(&split_balance(v)));
        assert_eq!(combine_chunks(&split_balance(v)), Some(v));
    }

    #[test]
    fn combine_overflow_is_detected() {
        assert_eq!(combine_chunks(&[0, 0, 0, u64::MAX]), None);
    }

    #[test]
    fn balance_encrypt_decrypt_roundtrip() {
        let pair = Keypair::from_seed(&[21u8; 32]);
        let value = (1u128 << 64) + 100;
        let balance = EncryptedBalance::encrypt_with(
            pair.encryption_key(),
            &split_balance(value),
            &randomness(1),
        );
        assert_eq!(
            balance.decrypt(pair.decryption_key(), CHUNK_WINDOW),
            Ok(value)
        );
    }

    #[test]
    fn aggregates_open_to_weighted_balance() {
        let pair = Keypair::from_seed(&[22u8; 32]);
        let value = 70u128;
        let balance = EncryptedBalance::encrypt_with(
            pair.encryption_key(),
            &split_balance(value),
            &randomness(2),
        );
        // C̄ − s·D̄ == v·G
        let opened = balance.aggregate_c()
            - pair.decryption_key().as_scalar() * balance.aggregate_d();
        assert_eq!(opened, Scalar::from(value) * *G);
    }

    #[test]
    fn balance_wire_roundtrip() {
        let pair = Keypair::from_seed(&[23u8; 32]);
        let balance = EncryptedBalance::encrypt_with(
            pair.encryption_key(),
            &split_balance(123456789),
            &randomness(3),
        );
        assert_eq!(EncryptedBalance::from_bytes(&balance.to_bytes()), Ok(balance));
    }
}
