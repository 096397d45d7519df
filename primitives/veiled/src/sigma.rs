//! Sigma-proof types and their fixed-layout wire encodings.
//!
//! Every field is 32 bytes: response scalars first, then commitment points,
//! per-chunk lists in chunk order `i = 0..3`. The transfer proof carries an
//! optional tail of per-auditor commitment points, four per auditor in
//! auditor order. Deserialization rejects wrong lengths and non-canonical
//! scalars; points stay compressed until verification.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunks::CHUNK_COUNT;
use crate::ristretto::scalar_from_bytes;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("malformed proof encoding")]
pub struct MalformedProof;

const FIELD_SIZE: usize = 32;

/// 11 scalars and 10 points.
pub const WITHDRAWAL_PROOF_SIZE: usize = 21 * FIELD_SIZE;
/// 15 scalars and 18 points, before the auditor tail.
pub const TRANSFER_PROOF_BASE_SIZE: usize = 33 * FIELD_SIZE;
/// Tail stride per auditor: one commitment point per chunk.
pub const TRANSFER_AUDITOR_STRIDE: usize = CHUNK_COUNT * FIELD_SIZE;
/// 11 scalars and 10 points.
pub const ROTATION_PROOF_SIZE: usize = 21 * FIELD_SIZE;
/// 10 scalars and 10 points.
pub const NORMALIZATION_PROOF_SIZE: usize = 20 * FIELD_SIZE;

struct ProofReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ProofReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self) -> Result<[u8; FIELD_SIZE], MalformedProof> {
        if self.bytes.len() < FIELD_SIZE {
            return Err(MalformedProof);
        }
        let (field, rest) = self.bytes.split_at(FIELD_SIZE);
        self.bytes = rest;
        Ok(field.try_into().expect("split at field size"))
    }

    fn scalar(&mut self) -> Result<Scalar, MalformedProof> {
        scalar_from_bytes(&self.take()?).ok_or(MalformedProof)
    }

    fn scalars(&mut self) -> Result<[Scalar; CHUNK_COUNT], MalformedProof> {
        let mut out = [Scalar::ZERO; CHUNK_COUNT];
        for scalar in &mut out {
            *scalar = self.scalar()?;
        }
        Ok(out)
    }

    fn point(&mut self) -> Result<CompressedRistretto, MalformedProof> {
        Ok(CompressedRistretto(self.take()?))
    }

    fn points(&mut self) -> Result<[CompressedRistretto; CHUNK_COUNT], MalformedProof> {
        let mut out = [CompressedRistretto([0u8; 32]); CHUNK_COUNT];
        for point in &mut out {
            *point = self.point()?;
        }
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn finish(self) -> Result<(), MalformedProof> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(MalformedProof)
        }
    }
}

fn push_scalar(buf: &mut Vec<u8>, scalar: &Scalar) {
    buf.extend_from_slice(scalar.as_bytes());
}

fn push_point(buf: &mut Vec<u8>, point: &CompressedRistretto) {
    buf.extend_from_slice(point.as_bytes());
}

/// Proof for the withdrawal statement (§ balance, new-ciphertext
/// well-formedness, key ownership).
#[allow(non_snake_case)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalSigmaProof {
    pub alpha1: Scalar,
    pub alpha2: Scalar,
    pub alpha3s: [Scalar; CHUNK_COUNT],
    pub alpha4: Scalar,
    pub alpha5s: [Scalar; CHUNK_COUNT],
    pub X1: CompressedRistretto,
    pub X2s: [CompressedRistretto; CHUNK_COUNT],
    pub X3: CompressedRistretto,
    pub X4s: [CompressedRistretto; CHUNK_COUNT],
}

impl WithdrawalSigmaProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(WITHDRAWAL_PROOF_SIZE);
        push_scalar(&mut buf, &self.alpha1);
        push_scalar(&mut buf, &self.alpha2);
        for alpha in &self.alpha3s {
            push_scalar(&mut buf, alpha);
        }
        push_scalar(&mut buf, &self.alpha4);
        for alpha in &self.alpha5s {
            push_scalar(&mut buf, alpha);
        }
        push_point(&mut buf, &self.X1);
        for x in &self.X2s {
            push_point(&mut buf, x);
        }
        push_point(&mut buf, &self.X3);
        for x in &self.X4s {
            push_point(&mut buf, x);
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedProof> {
        if bytes.len() != WITHDRAWAL_PROOF_SIZE {
            return Err(MalformedProof);
        }
        let mut reader = ProofReader::new(bytes);
        let proof = Self {
            alpha1: reader.scalar()?,
            alpha2: reader.scalar()?,
            alpha3s: reader.scalars()?,
            alpha4: reader.scalar()?,
            alpha5s: reader.scalars()?,
            X1: reader.point()?,
            X2s: reader.points()?,
            X3: reader.point()?,
            X4s: reader.points()?,
        };
        reader.finish()?;
        Ok(proof)
    }
}

/// Proof for the transfer statement, with one commitment list per auditor.
#[allow(non_snake_case)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSigmaProof {
    pub alpha1: Scalar,
    pub alpha2: Scalar,
    pub alpha3s: [Scalar; CHUNK_COUNT],
    pub alpha4s: [Scalar; CHUNK_COUNT],
    pub alpha5: Scalar,
    pub alpha6s: [Scalar; CHUNK_COUNT],
    pub X1: CompressedRistretto,
    pub X2s: [CompressedRistretto; CHUNK_COUNT],
    pub X3s: [CompressedRistretto; CHUNK_COUNT],
    pub X4s: [CompressedRistretto; CHUNK_COUNT],
    pub X5: CompressedRistretto,
    pub X6s: [CompressedRistretto; CHUNK_COUNT],
    pub auditor_Xs: Vec<[CompressedRistretto; CHUNK_COUNT]>,
}

impl TransferSigmaProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            TRANSFER_PROOF_BASE_SIZE + self.auditor_Xs.len() * TRANSFER_AUDITOR_STRIDE,
        );
        push_scalar(&mut buf, &self.alpha1);
        push_scalar(&mut buf, &self.alpha2);
        for alpha in &self.alpha3s {
            push_scalar(&mut buf, alpha);
        }
        for alpha in &self.alpha4s {
            push_scalar(&mut buf, alpha);
        }
        push_scalar(&mut buf, &self.alpha5);
        for alpha in &self.alpha6s {
            push_scalar(&mut buf, alpha);
        }
        push_point(&mut buf, &self.X1);
        for x in &self.X2s {
            push_point(&mut buf, x);
        }
        for x in &self.X3s {
            push_point(&mut buf, x);
        }
        for x in &self.X4s {
            push_point(&mut buf, x);
        }
        push_point(&mut buf, &self.X5);
        for x in &self.X6s {
            push_point(&mut buf, x);
        }
        for xs in &self.auditor_Xs {
            for x in xs {
                push_point(&mut buf, x);
            }
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedProof> {
        if bytes.len() < TRANSFER_PROOF_BASE_SIZE
            || (bytes.len() - TRANSFER_PROOF_BASE_SIZE) % TRANSFER_AUDITOR_STRIDE != 0
        {
            return Err(MalformedProof);
        }
        let mut reader = ProofReader::new(bytes);
        let mut proof = Self {
            alpha1: reader.scalar()?,
            alpha2: reader.scalar()?,
            alpha3s: reader.scalars()?,
            alpha4s: reader.scalars()?,
            alpha5: reader.scalar()?,
            alpha6s: reader.scalars()?,
            X1: reader.point()?,
            X2s: reader.points()?,
            X3s: reader.points()?,
            X4s: reader.points()?,
            X5: reader.point()?,
            X6s: reader.points()?,
            auditor_Xs: Vec::new(),
        };
        while reader.remaining() > 0 {
            proof.auditor_Xs.push(reader.points()?);
        }
        reader.finish()?;
        Ok(proof)
    }
}

/// Proof for the key-rotation statement.
#[allow(non_snake_case)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSigmaProof {
    pub alpha1: Scalar,
    pub alpha2: Scalar,
    pub alpha3: Scalar,
    pub alpha4s: [Scalar; CHUNK_COUNT],
    pub alpha5s: [Scalar; CHUNK_COUNT],
    pub X1: CompressedRistretto,
    pub X2s: [CompressedRistretto; CHUNK_COUNT],
    pub X3s: [CompressedRistretto; CHUNK_COUNT],
    pub X4: CompressedRistretto,
}

impl RotationSigmaProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ROTATION_PROOF_SIZE);
        push_scalar(&mut buf, &self.alpha1);
        push_scalar(&mut buf, &self.alpha2);
        push_scalar(&mut buf, &self.alpha3);
        for alpha in &self.alpha4s {
            push_scalar(&mut buf, alpha);
        }
        for alpha in &self.alpha5s {
            push_scalar(&mut buf, alpha);
        }
        push_point(&mut buf, &self.X1);
        for x in &self.X2s {
            push_point(&mut buf, x);
        }
        for x in &self.X3s {
            push_point(&mut buf, x);
        }
        push_point(&mut buf, &self.X4);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedProof> {
        if bytes.len() != ROTATION_PROOF_SIZE {
            return Err(MalformedProof);
        }
        let mut reader = ProofReader::new(bytes);
        let proof = Self {
            alpha1: reader.scalar()?,
            alpha2: reader.scalar()?,
            alpha3: reader.scalar()?,
            alpha4s: reader.scalars()?,
            alpha5s: reader.scalars()?,
            X1: reader.point()?,
            X2s: reader.points()?,
            X3s: reader.points()?,
            X4: reader.point()?,
        };
        reader.finish()?;
        Ok(proof)
    }
}

/// Proof for the normalization statement.
#[allow(non_snake_case)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationSigmaProof {
    pub alpha1: Scalar,
    pub alpha2: Scalar,
    pub alpha3s: [Scalar; CHUNK_COUNT],
    pub alpha4s: [Scalar; CHUNK_COUNT],
    pub X1: CompressedRistretto,
    pub X2s: [CompressedRistretto; CHUNK_COUNT],
    pub X3s: [CompressedRistretto; CHUNK_COUNT],
    pub X4: CompressedRistretto,
}

impl NormalizationSigmaProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NORMALIZATION_PROOF_SIZE);
        push_scalar(&mut buf, &self.alpha1);
        push_scalar(&mut buf, &self.alpha2);
        for alpha in &self.alpha3s {
            push_scalar(&mut buf, alpha);
        }
        for alpha in &self.alpha4s {
            push_scalar(&mut buf, alpha);
        }
        push_point(&mut buf, &self.X1);
        for x in &self.X2s {
            push_point(&mut buf, x);
        }
        for x in &self.X3s {
            push_point(&mut buf, x);
        }
        push_point(&mut buf, &self.X4);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedProof> {
        if bytes.len() != NORMALIZATION_PROOF_SIZE {
            return Err(MalformedProof);
        }
        let mut reader = ProofReader::new(bytes);
        let proof = Self {
            alpha1: reader.scalar()?,
            alpha2: reader.scalar()?,
            alpha3s: reader.scalars()?,
            alpha4s: reader.scalars()?,
            X1: reader.point()?,
            X2s: reader.points()?,
            X3s: reader.points()?,
            X4: reader.point()?,
        };
        reader.finish()?;
        Ok(proof)
    }
}
