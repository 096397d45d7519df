//! Bulletproofs backend for range-proof verification.

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek_ng as dalek_ng;
use merlin::Transcript;

use veiled_primitives::point_to_bytes;
use veiled_primitives::range::{RangeProofVerifier, RANGE_TRANSCRIPT_LABEL};

fn point_to_ng(point: &RistrettoPoint) -> Option<dalek_ng::ristretto::RistrettoPoint> {
    dalek_ng::ristretto::CompressedRistretto(point_to_bytes(point)).decompress()
}

/// Mirrors the prover-side transcript byte for byte.
fn range_transcript(
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

/// Stock Bulletproofs single-value verifier.
pub struct BulletproofRangeVerifier;

impl RangeProofVerifier for BulletproofRangeVerifier {
    fn verify(
        proof: &[u8],
        commitment: &[u8; 32],
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bits: usize,
    ) -> bool {
        let Ok(proof) = RangeProof::from_bytes(proof) else {
            return false;
        };
        let (Some(value_base_ng), Some(blinding_base_ng)) =
            (point_to_ng(value_base), point_to_ng(blinding_base))
        else {
            return false;
        };

        let pc_gens = PedersenGens {
            B: value_base_ng,
            B_blinding: blinding_base_ng,
        };
        let bp_gens = BulletproofGens::new(bits, 1);
        let mut transcript = range_transcript(value_base, blinding_base, bits);

        proof
            .verify_single(
                &bp_gens,
                &pc_gens,
                &mut transcript,
                &dalek_ng::ristretto::CompressedRistretto(*commitment),
                bits,
            )
            .is_ok()
    }
}
