//! Normalization authorization: re-chunk a balance whose chunks overflowed.
//!
//! Homomorphic additions on-chain can push a chunk past 2^32. Normalization
//! decrypts the overflowed chunks over a caller-supplied window, re-splits
//! the plaintext into 32-bit chunks under the same key, and proves the
//! plaintext unchanged with every new chunk back in range.

use std::ops::Range;

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veiled_primitives::transcript::normalization_challenge;
use veiled_primitives::{
    combine_chunks, random_scalar, split_balance, DecryptionError, DecryptionKey,
    EncryptedBalance, EncryptionKey, NormalizationSigmaProof, RangeProofBytes, RangeProofProver,
    CHUNK_COUNT, G, H, RANGE_BITS,
};

use crate::{draw_seed, push_length_prefixed, AuthorizationBuilder, ProverError};

#[derive(Zeroize, ZeroizeOnDrop)]
struct NormalizationNonces {
    kappas: [Scalar; CHUNK_COUNT],
    rhos: [Scalar; CHUNK_COUNT],
    sigma: Scalar,
    tau: Scalar,
}

/// Builder for the normalization statement: old and new balance encrypt the
/// same plaintext under the same key, and every new chunk is in 32-bit
/// range.
pub struct NormalizationProver {
    decryption_key: DecryptionKey,
    encryption_key: EncryptionKey,
    current_balance: EncryptedBalance,
    value: u128,
    new_chunks: [u64; CHUNK_COUNT],
    new_randomness: [Scalar; CHUNK_COUNT],
    new_balance: EncryptedBalance,
    nonces: NormalizationNonces,
    range_seeds: [[u8; 32]; CHUNK_COUNT],
}

impl NormalizationProver {
    /// `window` bounds the per-chunk discrete-log search; overflowed chunks
    /// live in `[0, 2^64)`, and the caller usually knows a much tighter
    /// bound from the deposits that overflowed the balance.
    pub fn new(
        decryption_key: &DecryptionKey,
        current_balance: &EncryptedBalance,
        window: Range<u64>,
        rng_seed: [u8; 32],
    ) -> Result<Self, ProverError> {
        if window.is_empty() {
            return Err(ProverError::InvalidInput("empty decryption window"));
        }
        let encryption_key = decryption_key.encryption_key();
        let chunks = current_balance.decrypt_chunks(decryption_key, window)?;
        let value = combine_chunks(&chunks).ok_or(DecryptionError::BalanceOverflow)?;
        let new_chunks = split_balance(value);

        let mut rng = ChaCha20Rng::from_seed(rng_seed);
        let new_randomness: [Scalar; CHUNK_COUNT] =
            core::array::from_fn(|_| random_scalar(&mut rng));
        let nonces = NormalizationNonces {
            kappas: core::array::from_fn(|_| random_scalar(&mut rng)),
            rhos: core::array::from_fn(|_| random_scalar(&mut rng)),
            sigma: random_scalar(&mut rng),
            tau: random_scalar(&mut rng),
        };
        let range_seeds = core::array::from_fn(|_| draw_seed(&mut rng));

        let new_balance =
            EncryptedBalance::encrypt_with(&encryption_key, &new_chunks, &new_randomness);

        debug!("normalization builder ready");
        Ok(Self {
            decryption_key: decryption_key.clone(),
            encryption_key,
            current_balance: *current_balance,
            value,
            new_chunks,
            new_randomness,
            new_balance,
            nonces,
            range_seeds,
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    /// The recombined plaintext balance.
    pub fn value(&self) -> u128 {
        self.value
    }
}

impl AuthorizationBuilder for NormalizationProver {
    type SigmaProof = NormalizationSigmaProof;
    type Authorization = NormalizationAuthorization;

    fn sigma_proof(&self) -> NormalizationSigmaProof {
        let p = self.encryption_key.as_point();
        let d_diff = self.current_balance.aggregate_d() - self.new_balance.aggregate_d();

        let x1 = (self.nonces.sigma * d_diff).compress();
        let x2s: [CompressedRistretto; CHUNK_COUNT] =
            core::array::from_fn(|i| (self.nonces.rhos[i] * p).compress());
        let x3s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.kappas[i] * *G + self.nonces.rhos[i] * *H).compress()
        });
        let x4 = (self.nonces.tau * *H).compress();

        let chi = normalization_challenge(
            &self.encryption_key,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2s,
            &x3s,
            &x4,
        );

        NormalizationSigmaProof {
            alpha1: self.nonces.sigma + chi * self.decryption_key.as_scalar(),
            alpha2: self.nonces.tau + chi * self.decryption_key.inverted(),
            alpha3s: core::array::from_fn(|i| {
                self.nonces.rhos[i] + chi * self.new_randomness[i]
            }),
            alpha4s: core::array::from_fn(|i| {
                self.nonces.kappas[i] + chi * Scalar::from(self.new_chunks[i])
            }),
            X1: x1,
            X2s: x2s,
            X3s: x3s,
            X4: x4,
        }
    }

    fn range_proofs<RP: RangeProofProver>(&self) -> Result<Vec<RangeProofBytes>, ProverError> {
        use rayon::prelude::*;

        (0..CHUNK_COUNT)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha20Rng::from_seed(self.range_seeds[i]);
                let (proof, _) = RP::prove(
                    self.new_chunks[i],
                    self.decryption_key.as_scalar(),
                    &G,
                    &self.new_balance.0[i].D,
                    RANGE_BITS,
                    &mut rng,
                )?;
                Ok(proof)
            })
            .collect()
    }

    fn authorize<RP: RangeProofProver>(&self) -> Result<NormalizationAuthorization, ProverError> {
        let (sigma_proof, range_proofs) =
            rayon::join(|| self.sigma_proof(), || self.range_proofs::<RP>());
        Ok(NormalizationAuthorization {
            sigma_proof,
            range_proofs: range_proofs?,
            new_balance: self.new_balance,
        })
    }
}

/// Everything the submission layer needs for a normalization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizationAuthorization {
    pub sigma_proof: NormalizationSigmaProof,
    /// One 32-bit proof per normalized chunk, bases `(G, D′ᵢ)`.
    pub range_proofs: Vec<RangeProofBytes>,
    pub new_balance: EncryptedBalance,
}

impl NormalizationAuthorization {
    /// `new_balance(256) ‖ sigma ‖ (len ‖ proof)×4`, lengths little-endian
    /// u16.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.new_balance.to_bytes());
        bytes.extend_from_slice(&self.sigma_proof.to_bytes());
        for proof in &self.range_proofs {
            push_length_prefixed(&mut bytes, proof);
        }
        bytes
    }
}
