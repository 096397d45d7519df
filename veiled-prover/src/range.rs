//! Bulletproofs backend for single-value range proofs.
//!
//! The `bulletproofs` crate is built on `curve25519-dalek-ng`, so bases and
//! blindings cross the fork boundary through their canonical byte encodings.

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek_ng as dalek_ng;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

use veiled_primitives::range::{
    RangeProofBytes, RangeProofError, RangeProofProver, RANGE_TRANSCRIPT_LABEL,
};
use veiled_primitives::point_to_bytes;

pub(crate) fn point_to_ng(point: &RistrettoPoint) -> Option<dalek_ng::ristretto::RistrettoPoint> {
    dalek_ng::ristretto::CompressedRistretto(point_to_bytes(point)).decompress()
}

pub(crate) fn scalar_to_ng(scalar: &Scalar) -> dalek_ng::scalar::Scalar {
    dalek_ng::scalar::Scalar::from_bytes_mod_order(scalar.to_bytes())
}

/// Transcript binding the proof to its bases and width. Must match the
/// verifier-side construction byte for byte.
pub(crate) fn range_transcript(
    value_base: &RistrettoPoint,
    blinding_base: &RistrettoPoint,
    bits: usize,
) -> Transcript {
    let mut transcript = Transcript::new(RANGE_TRANSCRIPT_LABEL);
    transcript.append_message(b"value_base", &point_to_bytes(value_base));
    transcript.append_message(b"blinding_base", &point_to_bytes(blinding_base));
    transcript.append_u64(b"bits", bits as u64);
    transcript
}

/// Stock Bulletproofs single-value prover.
pub struct BulletproofRangeProver;

impl RangeProofProver for BulletproofRangeProver {
    fn prove<R: RngCore + CryptoRng>(
        value: u64,
        blinding: &Scalar,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bits: usize,
        rng: &mut R,
    ) -> Result<(RangeProofBytes, [u8; 32]), RangeProofError> {
        if bits < 64 && value >> bits != 0 {
            return Err(RangeProofError::ValueTooLarge(bits));
        }

        let pc_gens = PedersenGens {
            B: point_to_ng(value_base).ok_or(RangeProofError::Generation)?,
            B_blinding: point_to_ng(blinding_base).ok_or(RangeProofError::Generation)?,
        };
        let bp_gens = BulletproofGens::new(bits, 1);
        let mut transcript = range_transcript(value_base, blinding_base, bits);

        let (proof, commitment) = RangeProof::prove_single_with_rng(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            value,
            &scalar_to_ng(blinding),
            bits,
            rng,
        )
        .map_err(|_| RangeProofError::Generation)?;

        Ok((proof.to_bytes(), commitment.to_bytes()))
    }
}
