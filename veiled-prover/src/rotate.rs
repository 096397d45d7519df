//! Key-rotation authorization: re-encrypt a balance under a new key.
//!
//! Old and new ciphertext vectors encrypt the same chunks, so the balance
//! must be normalized first; the per-chunk old/new consistency relation
//! would not hold across a re-chunking.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veiled_primitives::transcript::rotation_challenge;
use veiled_primitives::{
    random_scalar, DecryptionKey, EncryptedBalance, EncryptionKey, RangeProofBytes,
    RangeProofProver, RotationSigmaProof, CHUNK_COUNT, CHUNK_WINDOW, G, H, RANGE_BITS,
};

use crate::{draw_seed, push_length_prefixed, AuthorizationBuilder, ProverError};

#[derive(Zeroize, ZeroizeOnDrop)]
struct RotationNonces {
    kappas: [Scalar; CHUNK_COUNT],
    rhos: [Scalar; CHUNK_COUNT],
    sigma_old: Scalar,
    sigma_new: Scalar,
    tau: Scalar,
}

/// Builder for the key-rotation statement: the prover knows the old key
/// `sₒ`, the new key `sₙ`, and `sₒ⁻¹`, and old and new balances encrypt the
/// same chunk vector.
pub struct KeyRotationProver {
    old_decryption_key: DecryptionKey,
    new_decryption_key: DecryptionKey,
    old_key: EncryptionKey,
    new_key: EncryptionKey,
    current_balance: EncryptedBalance,
    chunks: [u64; CHUNK_COUNT],
    new_randomness: [Scalar; CHUNK_COUNT],
    new_balance: EncryptedBalance,
    nonces: RotationNonces,
    range_seeds: [[u8; 32]; CHUNK_COUNT],
}

impl KeyRotationProver {
    pub fn new(
        old_decryption_key: &DecryptionKey,
        new_decryption_key: &DecryptionKey,
        current_balance: &EncryptedBalance,
        rng_seed: [u8; 32],
    ) -> Result<Self, ProverError> {
        let old_key = old_decryption_key.encryption_key();
        let new_key = new_decryption_key.encryption_key();
        let chunks = current_balance.decrypt_chunks(old_decryption_key, CHUNK_WINDOW)?;

        let mut rng = ChaCha20Rng::from_seed(rng_seed);
        let new_randomness: [Scalar; CHUNK_COUNT] =
            core::array::from_fn(|_| random_scalar(&mut rng));
        let nonces = RotationNonces {
            kappas: core::array::from_fn(|_| random_scalar(&mut rng)),
            rhos: core::array::from_fn(|_| random_scalar(&mut rng)),
            sigma_old: random_scalar(&mut rng),
            sigma_new: random_scalar(&mut rng),
            tau: random_scalar(&mut rng),
        };
        let range_seeds = core::array::from_fn(|_| draw_seed(&mut rng));

        let new_balance = EncryptedBalance::encrypt_with(&new_key, &chunks, &new_randomness);

        debug!("key rotation builder ready");
        Ok(Self {
            old_decryption_key: old_decryption_key.clone(),
            new_decryption_key: new_decryption_key.clone(),
            old_key,
            new_key,
            current_balance: *current_balance,
            chunks,
            new_randomness,
            new_balance,
            nonces,
            range_seeds,
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    pub fn new_key(&self) -> &EncryptionKey {
        &self.new_key
    }
}

impl AuthorizationBuilder for KeyRotationProver {
    type SigmaProof = RotationSigmaProof;
    type Authorization = KeyRotationAuthorization;

    fn sigma_proof(&self) -> RotationSigmaProof {
        let d_old_agg = self.current_balance.aggregate_d();
        let d_new_agg = self.new_balance.aggregate_d();

        let x1 =
            (self.nonces.sigma_old * d_old_agg - self.nonces.sigma_new * d_new_agg).compress();
        let x2s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.sigma_old * self.current_balance.0[i].D
                - self.nonces.sigma_new * self.new_balance.0[i].D)
                .compress()
        });
        let x3s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.kappas[i] * *G + self.nonces.rhos[i] * *H).compress()
        });
        let x4 = (self.nonces.tau * *H).compress();

        let chi = rotation_challenge(
            &self.old_key,
            &self.new_key,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2s,
            &x3s,
            &x4,
        );

        RotationSigmaProof {
            alpha1: self.nonces.sigma_old + chi * self.old_decryption_key.as_scalar(),
            alpha2: self.nonces.sigma_new + chi * self.new_decryption_key.as_scalar(),
            alpha3: self.nonces.tau + chi * self.old_decryption_key.inverted(),
            alpha4s: core::array::from_fn(|i| {
                self.nonces.rhos[i] + chi * self.new_randomness[i]
            }),
            alpha5s: core::array::from_fn(|i| {
                self.nonces.kappas[i] + chi * Scalar::from(self.chunks[i])
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
                    self.chunks[i],
                    self.new_decryption_key.as_scalar(),
                    &G,
                    &self.new_balance.0[i].D,
                    RANGE_BITS,
                    &mut rng,
                )?;
                Ok(proof)
            })
            .collect()
    }

    fn authorize<RP: RangeProofProver>(&self) -> Result<KeyRotationAuthorization, ProverError> {
        let (sigma_proof, range_proofs) =
            rayon::join(|| self.sigma_proof(), || self.range_proofs::<RP>());
        Ok(KeyRotationAuthorization {
            sigma_proof,
            range_proofs: range_proofs?,
            new_balance: self.new_balance,
        })
    }
}

/// Everything the submission layer needs for a key rotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRotationAuthorization {
    pub sigma_proof: RotationSigmaProof,
    /// One 32-bit proof per chunk, bases `(G, D′ᵢ)`.
    pub range_proofs: Vec<RangeProofBytes>,
    pub new_balance: EncryptedBalance,
}

impl KeyRotationAuthorization {
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
