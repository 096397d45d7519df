//! # veiled-verifier — pure verification of veiled balance authorizations
//!
//! The verifiers are pure functions of public inputs and proof material:
//! they never see a decryption key or prover state. Each sigma verifier
//! recomputes every commitment point from the response scalars, the
//! Fiat–Shamir challenge and the public data, and compares against the
//! commitments carried in the proof; a single mismatch verifies false.
//!
//! Byte-level entry points (`verify_*_bytes`) parse the fixed wire layout
//! first; malformed encodings verify false rather than erroring.
//!
//! Range proofs are checked through the same pluggable backend interface the
//! prover uses; [`BulletproofRangeVerifier`] is the stock implementation.

mod range;
mod sigma;
#[cfg(test)]
mod tests;

pub use range::BulletproofRangeVerifier;
pub use sigma::{verify_normalization, verify_rotation, verify_transfer, verify_withdrawal};

use curve25519_dalek::ristretto::RistrettoPoint;

use veiled_primitives::{
    point_to_bytes, EncryptedBalance, EncryptionKey, NormalizationSigmaProof, RangeProofBytes,
    RangeProofVerifier, RotationSigmaProof, TransferSigmaProof, WithdrawalSigmaProof,
    CHUNK_COUNT, G, H, RANGE_BITS,
};

/// Verify the per-chunk range proofs of a new balance: commitment `C′ᵢ`
/// against bases `(G, D′ᵢ)`.
pub fn verify_new_balance_range_proofs<RV: RangeProofVerifier>(
    new_balance: &EncryptedBalance,
    proofs: &[RangeProofBytes],
) -> bool {
    proofs.len() == CHUNK_COUNT
        && new_balance.0.iter().zip(proofs).all(|(ciphertext, proof)| {
            RV::verify(
                proof,
                &point_to_bytes(&ciphertext.C),
                &G,
                &ciphertext.D,
                RANGE_BITS,
            )
        })
}

/// Verify the per-chunk range proofs of a transfer amount: commitment `Cᵢ`
/// of the recipient ciphertext against bases `(G, H)`.
pub fn verify_amount_range_proofs<RV: RangeProofVerifier>(
    amount_ciphertexts: &EncryptedBalance,
    proofs: &[RangeProofBytes],
) -> bool {
    proofs.len() == CHUNK_COUNT
        && amount_ciphertexts
            .0
            .iter()
            .zip(proofs)
            .all(|(ciphertext, proof)| {
                RV::verify(proof, &point_to_bytes(&ciphertext.C), &G, &H, RANGE_BITS)
            })
}

pub fn verify_withdrawal_bytes(
    key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    amount: u64,
    new_balance: &EncryptedBalance,
    proof_bytes: &[u8],
) -> bool {
    match WithdrawalSigmaProof::from_bytes(proof_bytes) {
        Ok(proof) => verify_withdrawal(key, current_balance, amount, new_balance, &proof),
        Err(_) => false,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn verify_transfer_bytes(
    sender_key: &EncryptionKey,
    recipient_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    amount_ciphertexts: &EncryptedBalance,
    auditor_keys: &[EncryptionKey],
    auditor_handles: &[[RistrettoPoint; CHUNK_COUNT]],
    proof_bytes: &[u8],
) -> bool {
    match TransferSigmaProof::from_bytes(proof_bytes) {
        Ok(proof) => verify_transfer(
            sender_key,
            recipient_key,
            current_balance,
            new_balance,
            amount_ciphertexts,
            auditor_keys,
            auditor_handles,
            &proof,
        ),
        Err(_) => false,
    }
}

pub fn verify_rotation_bytes(
    old_key: &EncryptionKey,
    new_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    proof_bytes: &[u8],
) -> bool {
    match RotationSigmaProof::from_bytes(proof_bytes) {
        Ok(proof) => verify_rotation(old_key, new_key, current_balance, new_balance, &proof),
        Err(_) => false,
    }
}

pub fn verify_normalization_bytes(
    key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    proof_bytes: &[u8],
) -> bool {
    match NormalizationSigmaProof::from_bytes(proof_bytes) {
        Ok(proof) => verify_normalization(key, current_balance, new_balance, &proof),
        Err(_) => false,
    }
}
