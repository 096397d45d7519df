//! # veiled-primitives — shared types for the veiled balance core
//!
//! Building blocks used by both `veiled-prover` and `veiled-verifier`:
//!
//! - Ristretto255 group plumbing: the base point `G`, the independent
//!   generator `H` (hash-to-curve of a fixed label), SHA-512 hash-to-scalar
//!   and uniform scalar sampling ([`ristretto`]).
//! - Twisted ElGamal encryption with decryption key `s` and encryption key
//!   `P = (1/s)·H` ([`elgamal`]), including bounded discrete-log decryption
//!   ([`dlog`]).
//! - The chunked balance representation: a 128-bit balance as four 32-bit
//!   chunks, each encrypted independently ([`chunks`]).
//! - The SHA-512 Fiat–Shamir transcript with the fixed domain-separation
//!   tags, and the per-protocol challenge derivations ([`transcript`]).
//! - The four sigma-proof types and their fixed 32-byte-field wire layouts
//!   ([`sigma`]).
//! - The pluggable single-value range-proof interface ([`range`]).
//!
//! Everything on the wire is a concatenation of 32-byte fields: scalars in
//! little-endian canonical form, points as compressed Ristretto.

pub mod chunks;
pub mod dlog;
pub mod elgamal;
pub mod range;
pub mod ristretto;
pub mod sigma;
pub mod transcript;

pub use chunks::{
    chunk_weight, combine_chunks, is_normalized, split_amount, split_balance, EncryptedBalance,
    CHUNK_BITS, CHUNK_COUNT, CHUNK_WINDOW,
};
pub use elgamal::{
    Ciphertext, DecompressionError, DecryptionError, DecryptionKey, EncryptionKey, Keypair,
    CIPHERTEXT_SIZE, RISTRETTO_COMPRESSED_SIZE, SCALAR_SIZE,
};
pub use range::{RangeProofBytes, RangeProofError, RangeProofProver, RangeProofVerifier, RANGE_BITS};
pub use ristretto::{point_from_bytes, point_to_bytes, random_scalar, scalar_from_bytes, G, H};
pub use sigma::{
    MalformedProof, NormalizationSigmaProof, RotationSigmaProof, TransferSigmaProof,
    WithdrawalSigmaProof,
};
pub use transcript::SigmaTranscript;
