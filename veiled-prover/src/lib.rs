//! # veiled-prover — proof generation for veiled balance operations
//!
//! Client-side builders for the four authorizations a veiled balance
//! supports:
//!
//! - [`WithdrawProver`] - spend a public amount from a veiled balance
//! - [`TransferProver`] - move a hidden amount to a recipient, with
//!   optional auditors
//! - [`KeyRotationProver`] - re-encrypt a balance under a new key
//! - [`NormalizationProver`] - re-chunk a balance whose chunks overflowed
//!
//! Each builder is fully populated at construction: the current balance is
//! decrypted by bounded discrete-log search, the new chunk vector and all
//! randomness are derived from a caller-supplied 32-byte seed, and the new
//! ciphertexts are computed. After that, [`AuthorizationBuilder::sigma_proof`]
//! and [`AuthorizationBuilder::range_proofs`] are pure: the same builder
//! produces byte-identical proofs on every call, and the two can run in
//! parallel (authorize joins them with rayon).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use veiled_prover::{AuthorizationBuilder, BulletproofRangeProver, WithdrawProver};
//!
//! let prover = WithdrawProver::new(&decryption_key, &current_balance, 15, rng_seed)?;
//! let authorization = prover.authorize::<BulletproofRangeProver>()?;
//! // submit authorization.to_bytes() to the transaction layer
//! ```
//!
//! The range-proof backend is plugged in as a type parameter;
//! [`BulletproofRangeProver`] is the stock Bulletproofs implementation.

use rand_core::RngCore;
use thiserror::Error;

use veiled_primitives::{DecryptionError, RangeProofBytes, RangeProofError, RangeProofProver};

mod normalize;
mod range;
mod rotate;
mod transfer;
mod withdraw;

pub use normalize::{NormalizationAuthorization, NormalizationProver};
pub use range::BulletproofRangeProver;
pub use rotate::{KeyRotationAuthorization, KeyRotationProver};
pub use transfer::{TransferAuthorization, TransferProver};
pub use withdraw::{WithdrawAuthorization, WithdrawProver};

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("not enough funds, required: {required}, available: {available}")]
    InsufficientFunds { required: u128, available: u128 },
    #[error("balance decryption failed: {0}")]
    Decryption(#[from] DecryptionError),
    #[error("range proof generation failed: {0}")]
    RangeProof(#[from] RangeProofError),
}

/// Common surface of the four authorization builders.
///
/// `sigma_proof` and `range_proofs` are deterministic given the builder's
/// internal randomness; `authorize` runs both and assembles the result the
/// transaction-submission layer consumes.
pub trait AuthorizationBuilder {
    type SigmaProof;
    type Authorization;

    fn sigma_proof(&self) -> Self::SigmaProof;

    /// One proof per chunk, in chunk order; eight for transfers (amount
    /// chunks first), four otherwise. Chunks are proved in parallel.
    fn range_proofs<RP: RangeProofProver>(&self) -> Result<Vec<RangeProofBytes>, ProverError>;

    fn authorize<RP: RangeProofProver>(&self) -> Result<Self::Authorization, ProverError>;
}

pub(crate) fn draw_seed<R: RngCore>(rng: &mut R) -> [u8; 32] {
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    seed
}

pub(crate) fn push_length_prefixed(bytes: &mut Vec<u8>, blob: &[u8]) {
    bytes.extend_from_slice(&(blob.len() as u16).to_le_bytes());
    bytes.extend_from_slice(blob);
}
