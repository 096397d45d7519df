//! Transfer authorization: move a hidden amount to a recipient, optionally
//! disclosing it to auditors.
//!
//! One fresh randomness vector `rᵢ` is shared by the sender's new-balance
//! ciphertexts (under the sender key), the recipient amount ciphertexts
//! (under the recipient key) and the auditor decryption handles, so a single
//! per-chunk response proves them mutually consistent.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veiled_primitives::transcript::transfer_challenge;
use veiled_primitives::{
    chunk_weight, combine_chunks, random_scalar, split_amount, split_balance, DecryptionError,
    DecryptionKey, EncryptedBalance, EncryptionKey, RangeProofBytes, RangeProofProver,
    TransferSigmaProof, CHUNK_COUNT, CHUNK_WINDOW, G, H, RANGE_BITS,
};

use crate::{draw_seed, push_length_prefixed, AuthorizationBuilder, ProverError};

#[derive(Zeroize, ZeroizeOnDrop)]
struct TransferNonces {
    kappas: [Scalar; CHUNK_COUNT],
    mus: [Scalar; CHUNK_COUNT],
    rhos: [Scalar; CHUNK_COUNT],
    sigma: Scalar,
    tau: Scalar,
}

/// Builder for the transfer statement.
pub struct TransferProver {
    decryption_key: DecryptionKey,
    sender_key: EncryptionKey,
    recipient_key: EncryptionKey,
    auditor_keys: Vec<EncryptionKey>,
    current_balance: EncryptedBalance,
    remaining: u128,
    amount_chunks: [u64; CHUNK_COUNT],
    new_chunks: [u64; CHUNK_COUNT],
    randomness: [Scalar; CHUNK_COUNT],
    new_balance: EncryptedBalance,
    amount_ciphertexts: EncryptedBalance,
    auditor_handles: Vec<[RistrettoPoint; CHUNK_COUNT]>,
    nonces: TransferNonces,
    range_seeds: [[u8; 32]; 2 * CHUNK_COUNT],
}

impl TransferProver {
    pub fn new(
        decryption_key: &DecryptionKey,
        current_balance: &EncryptedBalance,
        recipient_key: &EncryptionKey,
        amount: u64,
        auditor_keys: &[EncryptionKey],
        rng_seed: [u8; 32],
    ) -> Result<Self, ProverError> {
        let sender_key = decryption_key.encryption_key();
        let chunks = current_balance.decrypt_chunks(decryption_key, CHUNK_WINDOW)?;
        let available = combine_chunks(&chunks).ok_or(DecryptionError::BalanceOverflow)?;
        let remaining =
            available
                .checked_sub(amount as u128)
                .ok_or(ProverError::InsufficientFunds {
                    required: amount as u128,
                    available,
                })?;
        let amount_chunks = split_amount(amount);
        let new_chunks = split_balance(remaining);

        // the shared randomness vector is drawn before every value derived
        // from it: ciphertexts, auditor handles and sigma commitments
        let mut rng = ChaCha20Rng::from_seed(rng_seed);
        let randomness: [Scalar; CHUNK_COUNT] = core::array::from_fn(|_| random_scalar(&mut rng));
        let nonces = TransferNonces {
            kappas: core::array::from_fn(|_| random_scalar(&mut rng)),
            mus: core::array::from_fn(|_| random_scalar(&mut rng)),
            rhos: core::array::from_fn(|_| random_scalar(&mut rng)),
            sigma: random_scalar(&mut rng),
            tau: random_scalar(&mut rng),
        };
        let range_seeds = core::array::from_fn(|_| draw_seed(&mut rng));

        let new_balance = EncryptedBalance::encrypt_with(&sender_key, &new_chunks, &randomness);
        let amount_ciphertexts =
            EncryptedBalance::encrypt_with(recipient_key, &amount_chunks, &randomness);
        let auditor_handles = auditor_keys
            .iter()
            .map(|key| core::array::from_fn(|i| randomness[i] * key.as_point()))
            .collect();

        debug!(
            "transfer builder ready, {} auditor(s)",
            auditor_keys.len()
        );
        Ok(Self {
            decryption_key: decryption_key.clone(),
            sender_key,
            recipient_key: *recipient_key,
            auditor_keys: auditor_keys.to_vec(),
            current_balance: *current_balance,
            remaining,
            amount_chunks,
            new_chunks,
            randomness,
            new_balance,
            amount_ciphertexts,
            auditor_handles,
            nonces,
            range_seeds,
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    /// The amount ciphertexts under the recipient key.
    pub fn amount_ciphertexts(&self) -> &EncryptedBalance {
        &self.amount_ciphertexts
    }

    /// Per-auditor decryption handles `rᵢ·Pₐ`, in auditor order.
    pub fn auditor_handles(&self) -> &[[RistrettoPoint; CHUNK_COUNT]] {
        &self.auditor_handles
    }
}

impl AuthorizationBuilder for TransferProver {
    type SigmaProof = TransferSigmaProof;
    type Authorization = TransferAuthorization;

    fn sigma_proof(&self) -> TransferSigmaProof {
        let d_agg = self.current_balance.aggregate_d();

        let beta: Scalar = (0..CHUNK_COUNT)
            .map(|i| chunk_weight(i) * self.nonces.kappas[i])
            .sum();
        let mu_agg: Scalar = (0..CHUNK_COUNT)
            .map(|i| chunk_weight(i) * self.nonces.mus[i])
            .sum();

        let x1 = ((beta + mu_agg) * *G + self.nonces.sigma * d_agg).compress();
        let x2s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.rhos[i] * self.recipient_key.as_point()).compress()
        });
        let x3s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.rhos[i] * self.sender_key.as_point()).compress()
        });
        let x4s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.mus[i] * *G + self.nonces.rhos[i] * *H).compress()
        });
        let x5 = (self.nonces.tau * *H).compress();
        let x6s: [CompressedRistretto; CHUNK_COUNT] = core::array::from_fn(|i| {
            (self.nonces.kappas[i] * *G + self.nonces.rhos[i] * *H).compress()
        });
        let auditor_xs: Vec<[CompressedRistretto; CHUNK_COUNT]> = self
            .auditor_keys
            .iter()
            .map(|key| core::array::from_fn(|i| (self.nonces.rhos[i] * key.as_point()).compress()))
            .collect();

        let chi = transfer_challenge(
            &self.sender_key,
            &self.recipient_key,
            &self.current_balance,
            &self.new_balance,
            &self.amount_ciphertexts,
            &self.auditor_keys,
            &self.auditor_handles,
            &x1,
            &x2s,
            &x3s,
            &x4s,
            &x5,
            &x6s,
            &auditor_xs,
        );

        TransferSigmaProof {
            alpha1: beta + chi * Scalar::from(self.remaining),
            alpha2: self.nonces.sigma + chi * self.decryption_key.as_scalar(),
            alpha3s: core::array::from_fn(|i| self.nonces.rhos[i] + chi * self.randomness[i]),
            alpha4s: core::array::from_fn(|i| {
                self.nonces.mus[i] + chi * Scalar::from(self.amount_chunks[i])
            }),
            alpha5: self.nonces.tau + chi * self.decryption_key.inverted(),
            alpha6s: core::array::from_fn(|i| {
                self.nonces.kappas[i] + chi * Scalar::from(self.new_chunks[i])
            }),
            X1: x1,
            X2s: x2s,
            X3s: x3s,
            X4s: x4s,
            X5: x5,
            X6s: x6s,
            auditor_Xs: auditor_xs,
        }
    }

    fn range_proofs<RP: RangeProofProver>(&self) -> Result<Vec<RangeProofBytes>, ProverError> {
        use rayon::prelude::*;

        // amount chunks over (G, H), then new-balance chunks over (G, D'_i)
        (0..2 * CHUNK_COUNT)
            .into_par_iter()
            .map(|task| {
                let mut rng = ChaCha20Rng::from_seed(self.range_seeds[task]);
                let (proof, _) = if task < CHUNK_COUNT {
                    RP::prove(
                        self.amount_chunks[task],
                        &self.randomness[task],
                        &G,
                        &H,
                        RANGE_BITS,
                        &mut rng,
                    )?
                } else {
                    let i = task - CHUNK_COUNT;
                    RP::prove(
                        self.new_chunks[i],
                        self.decryption_key.as_scalar(),
                        &G,
                        &self.new_balance.0[i].D,
                        RANGE_BITS,
                        &mut rng,
                    )?
                };
                Ok(proof)
            })
            .collect()
    }

    fn authorize<RP: RangeProofProver>(&self) -> Result<TransferAuthorization, ProverError> {
        let (sigma_proof, range_proofs) =
            rayon::join(|| self.sigma_proof(), || self.range_proofs::<RP>());
        Ok(TransferAuthorization {
            sigma_proof,
            range_proofs: range_proofs?,
            new_balance: self.new_balance,
            amount_ciphertexts: self.amount_ciphertexts,
            auditor_handles: self.auditor_handles.clone(),
        })
    }
}

/// Everything the submission layer needs for a transfer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferAuthorization {
    pub sigma_proof: TransferSigmaProof,
    /// Eight 32-bit proofs: amount chunks (bases `(G, H)`) then new-balance
    /// chunks (bases `(G, D′ᵢ)`), both in chunk order.
    pub range_proofs: Vec<RangeProofBytes>,
    pub new_balance: EncryptedBalance,
    pub amount_ciphertexts: EncryptedBalance,
    pub auditor_handles: Vec<[RistrettoPoint; CHUNK_COUNT]>,
}

impl TransferAuthorization {
    /// `new_balance(256) ‖ amount_cts(256) ‖ n_auditors(2) ‖ handles(128·n)
    /// ‖ sigma_len(2) ‖ sigma ‖ (len ‖ proof)×8`, lengths little-endian u16.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.new_balance.to_bytes());
        bytes.extend_from_slice(&self.amount_ciphertexts.to_bytes());
        bytes.extend_from_slice(&(self.auditor_handles.len() as u16).to_le_bytes());
        for handles in &self.auditor_handles {
            for handle in handles {
                bytes.extend_from_slice(&handle.compress().to_bytes());
            }
        }
        push_length_prefixed(&mut bytes, &self.sigma_proof.to_bytes());
        for proof in &self.range_proofs {
            push_length_prefixed(&mut bytes, proof);
        }
        bytes
    }
}
