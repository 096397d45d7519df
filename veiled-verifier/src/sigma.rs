//! Sigma-proof verification for the four protocols.
//!
//! Every check recomputes a commitment point from the responses, the
//! challenge and public data, and compares it with the point carried in the
//! proof. The challenge is rederived from the same absorption functions the
//! prover used, so any tampering with a public input or commitment shifts
//! `χ` and fails the equations.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use subtle::ConstantTimeEq;

use veiled_primitives::transcript::{
    normalization_challenge, rotation_challenge, transfer_challenge, withdrawal_challenge,
};
use veiled_primitives::{
    chunk_weight, EncryptedBalance, EncryptionKey, NormalizationSigmaProof, RotationSigmaProof,
    TransferSigmaProof, WithdrawalSigmaProof, CHUNK_COUNT, G, H,
};

fn decompress_chunk_points(
    points: &[CompressedRistretto; CHUNK_COUNT],
) -> Option<[RistrettoPoint; CHUNK_COUNT]> {
    let mut out = [RistrettoPoint::default(); CHUNK_COUNT];
    for (decompressed, compressed) in out.iter_mut().zip(points) {
        *decompressed = compressed.decompress()?;
    }
    Some(out)
}

fn points_equal(recomputed: &RistrettoPoint, committed: &RistrettoPoint) -> bool {
    bool::from(recomputed.ct_eq(committed))
}

/// Verify a withdrawal sigma proof against its public statement.
pub fn verify_withdrawal(
    key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    amount: u64,
    new_balance: &EncryptedBalance,
    proof: &WithdrawalSigmaProof,
) -> bool {
    let Some(x1) = proof.X1.decompress() else {
        return false;
    };
    let Some(x2s) = decompress_chunk_points(&proof.X2s) else {
        return false;
    };
    let Some(x3) = proof.X3.decompress() else {
        return false;
    };
    let Some(x4s) = decompress_chunk_points(&proof.X4s) else {
        return false;
    };

    let chi = withdrawal_challenge(
        key,
        amount,
        current_balance,
        new_balance,
        &proof.X1,
        &proof.X2s,
        &proof.X3,
        &proof.X4s,
    );
    let p = key.as_point();

    // chunk aggregation: α₁ == Σ wᵢ·α₅ᵢ
    let alpha5_agg: Scalar = (0..CHUNK_COUNT)
        .map(|i| chunk_weight(i) * proof.alpha5s[i])
        .sum();
    if proof.alpha1 != alpha5_agg {
        return false;
    }

    // balance: α₁·G + α₂·D̄ − χ·(C̄ − a·G) == X₁
    let balance_target = current_balance.aggregate_c() - Scalar::from(amount) * *G;
    let recomputed = RistrettoPoint::vartime_multiscalar_mul(
        [proof.alpha1, proof.alpha2, -chi],
        [*G, current_balance.aggregate_d(), balance_target],
    );
    if !points_equal(&recomputed, &x1) {
        return false;
    }

    for i in 0..CHUNK_COUNT {
        // new-D well-formedness: α₃ᵢ·P − χ·D′ᵢ == X₂ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha3s[i], -chi],
            [*p, new_balance.0[i].D],
        );
        if !points_equal(&recomputed, &x2s[i]) {
            return false;
        }

        // new-C chunk commitment: α₅ᵢ·G + α₃ᵢ·H − χ·C′ᵢ == X₄ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha5s[i], proof.alpha3s[i], -chi],
            [*G, *H, new_balance.0[i].C],
        );
        if !points_equal(&recomputed, &x4s[i]) {
            return false;
        }
    }

    // key ownership: α₄·H − χ·P == X₃
    let recomputed = RistrettoPoint::vartime_multiscalar_mul([proof.alpha4, -chi], [*H, *p]);
    points_equal(&recomputed, &x3)
}

/// Verify a transfer sigma proof against its public statement, including
/// the auditor key and handle lists.
#[allow(clippy::too_many_arguments)]
pub fn verify_transfer(
    sender_key: &EncryptionKey,
    recipient_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    amount_ciphertexts: &EncryptedBalance,
    auditor_keys: &[EncryptionKey],
    auditor_handles: &[[RistrettoPoint; CHUNK_COUNT]],
    proof: &TransferSigmaProof,
) -> bool {
    if auditor_keys.len() != auditor_handles.len()
        || auditor_keys.len() != proof.auditor_Xs.len()
    {
        return false;
    }

    let Some(x1) = proof.X1.decompress() else {
        return false;
    };
    let Some(x2s) = decompress_chunk_points(&proof.X2s) else {
        return false;
    };
    let Some(x3s) = decompress_chunk_points(&proof.X3s) else {
        return false;
    };
    let Some(x4s) = decompress_chunk_points(&proof.X4s) else {
        return false;
    };
    let Some(x5) = proof.X5.decompress() else {
        return false;
    };
    let Some(x6s) = decompress_chunk_points(&proof.X6s) else {
        return false;
    };
    let mut auditor_xs = Vec::with_capacity(proof.auditor_Xs.len());
    for xs in &proof.auditor_Xs {
        let Some(decompressed) = decompress_chunk_points(xs) else {
            return false;
        };
        auditor_xs.push(decompressed);
    }

    let chi = transfer_challenge(
        sender_key,
        recipient_key,
        current_balance,
        new_balance,
        amount_ciphertexts,
        auditor_keys,
        auditor_handles,
        &proof.X1,
        &proof.X2s,
        &proof.X3s,
        &proof.X4s,
        &proof.X5,
        &proof.X6s,
        &proof.auditor_Xs,
    );
    let p_sender = sender_key.as_point();
    let p_recipient = recipient_key.as_point();

    // chunk aggregation: α₁ == Σ wᵢ·α₆ᵢ
    let alpha6_agg: Scalar = (0..CHUNK_COUNT)
        .map(|i| chunk_weight(i) * proof.alpha6s[i])
        .sum();
    if proof.alpha1 != alpha6_agg {
        return false;
    }

    // balance: (α₁ + Σ wᵢ·α₄ᵢ)·G + α₂·D̄ − χ·C̄ == X₁
    let alpha4_agg: Scalar = (0..CHUNK_COUNT)
        .map(|i| chunk_weight(i) * proof.alpha4s[i])
        .sum();
    let recomputed = RistrettoPoint::vartime_multiscalar_mul(
        [proof.alpha1 + alpha4_agg, proof.alpha2, -chi],
        [
            *G,
            current_balance.aggregate_d(),
            current_balance.aggregate_c(),
        ],
    );
    if !points_equal(&recomputed, &x1) {
        return false;
    }

    for i in 0..CHUNK_COUNT {
        // recipient-D: α₃ᵢ·Pᵣ − χ·Dᵉᵢ == X₂ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha3s[i], -chi],
            [*p_recipient, amount_ciphertexts.0[i].D],
        );
        if !points_equal(&recomputed, &x2s[i]) {
            return false;
        }

        // sender-D of the new balance shares rᵢ: α₃ᵢ·Pₛ − χ·D′ᵢ == X₃ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha3s[i], -chi],
            [*p_sender, new_balance.0[i].D],
        );
        if !points_equal(&recomputed, &x3s[i]) {
            return false;
        }

        // amount chunk commitment: α₄ᵢ·G + α₃ᵢ·H − χ·Cᵉᵢ == X₄ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha4s[i], proof.alpha3s[i], -chi],
            [*G, *H, amount_ciphertexts.0[i].C],
        );
        if !points_equal(&recomputed, &x4s[i]) {
            return false;
        }

        // new-balance chunk commitment: α₆ᵢ·G + α₃ᵢ·H − χ·C′ᵢ == X₆ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha6s[i], proof.alpha3s[i], -chi],
            [*G, *H, new_balance.0[i].C],
        );
        if !points_equal(&recomputed, &x6s[i]) {
            return false;
        }
    }

    // key ownership: α₅·H − χ·Pₛ == X₅
    let recomputed =
        RistrettoPoint::vartime_multiscalar_mul([proof.alpha5, -chi], [*H, *p_sender]);
    if !points_equal(&recomputed, &x5) {
        return false;
    }

    // auditor binders share rᵢ: α₃ᵢ·Pₐ − χ·Dₐᵢ == X₇ᵢ
    for ((key, handles), xs) in auditor_keys
        .iter()
        .zip(auditor_handles)
        .zip(auditor_xs.iter())
    {
        for i in 0..CHUNK_COUNT {
            let recomputed = RistrettoPoint::vartime_multiscalar_mul(
                [proof.alpha3s[i], -chi],
                [*key.as_point(), handles[i]],
            );
            if !points_equal(&recomputed, &xs[i]) {
                return false;
            }
        }
    }

    true
}

/// Verify a key-rotation sigma proof against its public statement.
pub fn verify_rotation(
    old_key: &EncryptionKey,
    new_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    proof: &RotationSigmaProof,
) -> bool {
    let Some(x1) = proof.X1.decompress() else {
        return false;
    };
    let Some(x2s) = decompress_chunk_points(&proof.X2s) else {
        return false;
    };
    let Some(x3s) = decompress_chunk_points(&proof.X3s) else {
        return false;
    };
    let Some(x4) = proof.X4.decompress() else {
        return false;
    };

    let chi = rotation_challenge(
        old_key,
        new_key,
        current_balance,
        new_balance,
        &proof.X1,
        &proof.X2s,
        &proof.X3s,
        &proof.X4,
    );

    // aggregate balance equality: α₁·D̄ − α₂·D̄′ − χ·(C̄ − C̄′) == X₁
    let recomputed = RistrettoPoint::vartime_multiscalar_mul(
        [proof.alpha1, -proof.alpha2, -chi],
        [
            current_balance.aggregate_d(),
            new_balance.aggregate_d(),
            current_balance.aggregate_c() - new_balance.aggregate_c(),
        ],
    );
    if !points_equal(&recomputed, &x1) {
        return false;
    }

    for i in 0..CHUNK_COUNT {
        // per-chunk old/new consistency: α₁·Dᵢ − α₂·D′ᵢ − χ·(Cᵢ − C′ᵢ) == X₂ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha1, -proof.alpha2, -chi],
            [
                current_balance.0[i].D,
                new_balance.0[i].D,
                current_balance.0[i].C - new_balance.0[i].C,
            ],
        );
        if !points_equal(&recomputed, &x2s[i]) {
            return false;
        }

        // chunk commitment under the new key: α₅ᵢ·G + α₄ᵢ·H − χ·C′ᵢ == X₃ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha5s[i], proof.alpha4s[i], -chi],
            [*G, *H, new_balance.0[i].C],
        );
        if !points_equal(&recomputed, &x3s[i]) {
            return false;
        }
    }

    // old-key ownership: α₃·H − χ·Pₒ == X₄
    let recomputed =
        RistrettoPoint::vartime_multiscalar_mul([proof.alpha3, -chi], [*H, *old_key.as_point()]);
    points_equal(&recomputed, &x4)
}

/// Verify a normalization sigma proof against its public statement.
pub fn verify_normalization(
    key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    proof: &NormalizationSigmaProof,
) -> bool {
    let Some(x1) = proof.X1.decompress() else {
        return false;
    };
    let Some(x2s) = decompress_chunk_points(&proof.X2s) else {
        return false;
    };
    let Some(x3s) = decompress_chunk_points(&proof.X3s) else {
        return false;
    };
    let Some(x4) = proof.X4.decompress() else {
        return false;
    };

    let chi = normalization_challenge(
        key,
        current_balance,
        new_balance,
        &proof.X1,
        &proof.X2s,
        &proof.X3s,
        &proof.X4,
    );
    let p = key.as_point();

    // balance equality: α₁·(D̄ − D̄′) − χ·(C̄ − C̄′) == X₁
    let recomputed = RistrettoPoint::vartime_multiscalar_mul(
        [proof.alpha1, -chi],
        [
            current_balance.aggregate_d() - new_balance.aggregate_d(),
            current_balance.aggregate_c() - new_balance.aggregate_c(),
        ],
    );
    if !points_equal(&recomputed, &x1) {
        return false;
    }

    for i in 0..CHUNK_COUNT {
        // new-D well-formedness: α₃ᵢ·P − χ·D′ᵢ == X₂ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha3s[i], -chi],
            [*p, new_balance.0[i].D],
        );
        if !points_equal(&recomputed, &x2s[i]) {
            return false;
        }

        // chunk commitment: α₄ᵢ·G + α₃ᵢ·H − χ·C′ᵢ == X₃ᵢ
        let recomputed = RistrettoPoint::vartime_multiscalar_mul(
            [proof.alpha4s[i], proof.alpha3s[i], -chi],
            [*G, *H, new_balance.0[i].C],
        );
        if !points_equal(&recomputed, &x3s[i]) {
            return false;
        }
    }

    // key ownership: α₂·H − χ·P == X₄
    let recomputed = RistrettoPoint::vartime_multiscalar_mul([proof.alpha2, -chi], [*H, *p]);
    points_equal(&recomputed, &x4)
}
