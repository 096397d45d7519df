//! Withdrawal authorization: spend a public amount from a veiled balance.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veiled_primitives::transcript::withdrawal_challenge;
use veiled_primitives::{
    chunk_weight, combine_chunks, random_scalar, split_balance, DecryptionError, DecryptionKey,
    EncryptedBalance, EncryptionKey, RangeProofBytes, RangeProofProver, WithdrawalSigmaProof,
    CHUNK_COUNT, CHUNK_WINDOW, G, H, RANGE_BITS,
};

use crate::{draw_seed, push_length_prefixed, AuthorizationBuilder, ProverError};

#[derive(Zeroize, ZeroizeOnDrop)]
struct WithdrawNonces {
    kappas: [Scalar; CHUNK_COUNT],
    rhos: [Scalar; CHUNK_COUNT],
    sigma: Scalar,
    tau: Scalar,
}

/// Builder for the withdrawal statement: the prover knows `s` with
/// `P = (1/s)·H`, the current balance decrypts to `v` under `s`, and the new
/// ciphertexts encrypt the chunks of `v − amount` with known randomness.
pub struct WithdrawProver {
    decryption_key: DecryptionKey,
    encryption_key: EncryptionKey,
    current_balance: EncryptedBalance,
    amount: u64,
    remaining: u128,
    new_chunks: [u64; CHUNK_COUNT],
    new_randomness: [Scalar; CHUNK_COUNT],
    new_balance: EncryptedBalance,
    nonces: WithdrawNonces,
    range_seeds: [[u8; 32]; CHUNK_COUNT],
}

impl WithdrawProver {
    /// Decrypts the current balance (the only non-constant-time step),
    /// derives the new chunk vector and draws all randomness from
    /// `rng_seed`. The same seed reproduces the same proofs byte for byte.
    pub fn new(
        decryption_key: &DecryptionKey,
        current_balance: &EncryptedBalance,
        amount: u64,
        rng_seed: [u8; 32],
    ) -> Result<Self, ProverError> {
        let encryption_key = decryption_key.encryption_key();
        let chunks = current_balance.decrypt_chunks(decryption_key, CHUNK_WINDOW)?;
        let available = combine_chunks(&chunks).ok_or(DecryptionError::BalanceOverflow)?;
        let remaining =
            available
                .checked_sub(amount as u128)
                .ok_or(ProverError::InsufficientFunds {
                    required: amount as u128,
                    available,
                })?;
        let new_chunks = split_balance(remaining);

        let mut rng = ChaCha20Rng::from_seed(rng_seed);
        // ciphertext randomness is drawn before anything derived from it
        let new_randomness: [Scalar; CHUNK_COUNT] =
            core::array::from_fn(|_| random_scalar(&mut rng));
        let nonces = WithdrawNonces {
            kappas: core::array::from_fn(|_| random_scalar(&mut rng)),
            rhos: core::array::from_fn(|_| random_scalar(&mut rng)),
            sigma: random_scalar(&mut rng),
            tau: random_scalar(&mut rng),
        };
        let range_seeds = core::array::from_fn(|_| draw_seed(&mut rng));

        let new_balance =
            EncryptedBalance::encrypt_with(&encryption_key, &new_chunks, &new_randomness);

        debug!("withdrawal builder ready, amount {amount}");
        Ok(Self {
            decryption_key: decryption_key.clone(),
            encryption_key,
            current_balance: *current_balance,
            amount,
            remaining,
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

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption_key
    }
}

impl AuthorizationBuilder for WithdrawProver {
    type SigmaProof = WithdrawalSigmaProof;
    type Authorization = WithdrawAuthorization;

    fn sigma_proof(&self) -> WithdrawalSigmaProof {
        let p = self.encryption_key.as_point();
        let d_agg = self.current_balance.aggregate_d();

        let beta: Scalar = (0..CHUNK_COUNT)
            .map(|i| chunk_weight(i) * self.nonces.kappas[i])
            .sum();
        let x1 = (beta * *G + self.nonces.sigma * d_agg).compress();
        let x2s: [CompressedRistretto; CHUNK_COUNT] =
            core::array::from_fn(|i| (self.nonces.rhos[i] * p).compress());
        let x3 = (self.nonces.tau * *H).compress();
        let x4s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.kappas[i] * *G + self.nonces.rhos[i] * *H).compress()
        });

        let chi = withdrawal_challenge(
            &self.encryption_key,
            self.amount,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2s,
            &x3,
            &x4s,
        );

        WithdrawalSigmaProof {
            alpha1: beta + chi * Scalar::from(self.remaining),
            alpha2: self.nonces.sigma + chi * self.decryption_key.as_scalar(),
            alpha3s: core::array::from_fn(|i| {
                self.nonces.rhos[i] + chi * self.new_randomness[i]
            }),
            alpha4: self.nonces.tau + chi * self.decryption_key.inverted(),
            alpha5s: core::array::from_fn(|i| {
                self.nonces.kappas[i] + chi * Scalar::from(self.new_chunks[i])
            }),
            X1: x1,
            X2s: x2s,
            X3: x3,
            X4s: x4s,
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

    fn authorize<RP: RangeProofProver>(&self) -> Result<WithdrawAuthorization, ProverError> {
        let (sigma_proof, range_proofs) =
            rayon::join(|| self.sigma_proof(), || self.range_proofs::<RP>());
        Ok(WithdrawAuthorization {
            sigma_proof,
            range_proofs: range_proofs?,
            new_balance: self.new_balance,
        })
    }
}

/// Everything the submission layer needs for a withdrawal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawAuthorization {
    pub sigma_proof: WithdrawalSigmaProof,
    /// One 32-bit proof per new-balance chunk, bases `(G, D′ᵢ)`.
    pub range_proofs: Vec<RangeProofBytes>,
    pub new_balance: EncryptedBalance,
}

impl WithdrawAuthorization {
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
