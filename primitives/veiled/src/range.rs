//! Pluggable single-value range-proof backend.
//!
//! A proof shows that a Pedersen commitment `value·V + blinding·R` opens to
//! `value ∈ [0, 2^bits)` over caller-chosen bases `(V, R)`. Base selection
//! is what binds range validity to the sigma-protocol equations:
//!
//! - transfer-amount chunks are proved against `(G, H)` with the shared
//!   chunk randomness as blinding, so the commitment equals the `C`
//!   component of the recipient ciphertext;
//! - new-balance chunks are proved against `(G, D′ᵢ)` with the holder's
//!   secret key as blinding, so the commitment equals `C′ᵢ` because
//!   `s·D′ᵢ = r′ᵢ·H`.
//!
//! Backends are plugged in as type parameters; implementations live in the
//! prover and verifier crates.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::chunks::CHUNK_BITS;

/// Bit width of every per-chunk proof.
pub const RANGE_BITS: usize = CHUNK_BITS;

/// Merlin transcript label shared by the backend implementations.
pub const RANGE_TRANSCRIPT_LABEL: &[u8] = b"AptosVeiledCoin/RangeProof";

pub type RangeProofBytes = Vec<u8>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeProofError {
    #[error("value exceeds {0} bits")]
    ValueTooLarge(usize),
    #[error("range proof generation failed")]
    Generation,
}

pub trait RangeProofProver {
    /// Prove `value ∈ [0, 2^bits)` for the commitment
    /// `value·value_base + blinding·blinding_base`. Returns the serialized
    /// proof and the canonical commitment bytes.
    fn prove<R: RngCore + CryptoRng>(
        value: u64,
        blinding: &Scalar,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bits: usize,
        rng: &mut R,
    ) -> Result<(RangeProofBytes, [u8; 32]), RangeProofError>;
}

pub trait RangeProofVerifier {
    fn verify(
        proof: &[u8],
        commitment: &[u8; 32],
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bits: usize,
    ) -> bool;
}
