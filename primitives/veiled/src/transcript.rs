//! SHA-512 Fiat–Shamir transcripts for the sigma protocols.
//!
//! The challenge is `χ = SHA-512(DST ‖ t₁ ‖ t₂ ‖ …) mod ℓ` where every
//! absorbed element is a 32-byte canonical encoding. Absorption order is
//! part of the wire protocol: the per-protocol `*_challenge` functions below
//! are the single definition of that order, shared by prover and verifier.
//! Reordering, omission, or re-encoding of any input yields a different
//! challenge and an unverifiable proof.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha512};

use crate::chunks::{EncryptedBalance, CHUNK_COUNT};
use crate::elgamal::{Ciphertext, EncryptionKey};

/// Domain-separation tags, absorbed as the first bytes of every challenge.
pub mod dst {
    pub const WITHDRAWAL: &[u8] = b"AptosVeiledCoin/WithdrawalSubproofFiatShamir";
    pub const TRANSFER: &[u8] = b"AptosVeiledCoin/TransferSubproofFiatShamir";
    pub const ROTATION: &[u8] = b"AptosVeiledCoin/RotationSubproofFiatShamir";
    pub const NORMALIZATION: &[u8] = b"AptosVeiledCoin/NormalizationSubproofFiatShamir";
}

pub struct SigmaTranscript {
    hasher: Sha512,
}

impl SigmaTranscript {
    pub fn new(dst: &'static [u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(dst);
        Self { hasher }
    }

    pub fn append_point(&mut self, point: &CompressedRistretto) {
        self.hasher.update(point.as_bytes());
    }

    pub fn append_raw_point(&mut self, point: &RistrettoPoint) {
        self.hasher.update(point.compress().as_bytes());
    }

    pub fn append_scalar(&mut self, scalar: &Scalar) {
        self.hasher.update(scalar.as_bytes());
    }

    pub fn append_encryption_key(&mut self, key: &EncryptionKey) {
        self.hasher.update(key.to_bytes());
    }

    pub fn append_ciphertext(&mut self, ciphertext: &Ciphertext) {
        self.hasher.update(ciphertext.to_bytes());
    }

    pub fn append_balance(&mut self, balance: &EncryptedBalance) {
        for ciphertext in &balance.0 {
            self.append_ciphertext(ciphertext);
        }
    }

    pub fn challenge(self) -> Scalar {
        let digest = self.hasher.finalize();
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&digest);
        Scalar::from_bytes_mod_order_wide(&wide)
    }
}

/// Withdrawal challenge: key, public amount, current and new balance, then
/// the commitments in declared order.
pub fn withdrawal_challenge(
    key: &EncryptionKey,
    amount: u64,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &CompressedRistretto,
    x2s: &[CompressedRistretto; CHUNK_COUNT],
    x3: &CompressedRistretto,
    x4s: &[CompressedRistretto; CHUNK_COUNT],
) -> Scalar {
    let mut transcript = SigmaTranscript::new(dst::WITHDRAWAL);
    transcript.append_encryption_key(key);
    transcript.append_scalar(&Scalar::from(amount));
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_point(x1);
    for x in x2s {
        transcript.append_point(x);
    }
    transcript.append_point(x3);
    for x in x4s {
        transcript.append_point(x);
    }
    transcript.challenge()
}

/// Transfer challenge: both keys, the three ciphertext vectors, the auditor
/// keys with their decryption handles, then the commitments. Auditor count
/// is absorbed so the auditor tail cannot be reinterpreted.
#[allow(clippy::too_many_arguments)]
pub fn transfer_challenge(
    sender_key: &EncryptionKey,
    recipient_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    amount_ciphertexts: &EncryptedBalance,
    auditor_keys: &[EncryptionKey],
    auditor_handles: &[[RistrettoPoint; CHUNK_COUNT]],
    x1: &CompressedRistretto,
    x2s: &[CompressedRistretto; CHUNK_COUNT],
    x3s: &[CompressedRistretto; CHUNK_COUNT],
    x4s: &[CompressedRistretto; CHUNK_COUNT],
    x5: &CompressedRistretto,
    x6s: &[CompressedRistretto; CHUNK_COUNT],
    auditor_xs: &[[CompressedRistretto; CHUNK_COUNT]],
) -> Scalar {
    debug_assert_eq!(auditor_keys.len(), auditor_handles.len());
    debug_assert_eq!(auditor_keys.len(), auditor_xs.len());

    let mut transcript = SigmaTranscript::new(dst::TRANSFER);
    transcript.append_encryption_key(sender_key);
    transcript.append_encryption_key(recipient_key);
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_balance(amount_ciphertexts);
    transcript.append_scalar(&Scalar::from(auditor_keys.len() as u64));
    for (key, handles) in auditor_keys.iter().zip(auditor_handles) {
        transcript.append_encryption_key(key);
        for handle in handles {
            transcript.append_raw_point(handle);
        }
    }
    transcript.append_point(x1);
    for x in x2s {
        transcript.append_point(x);
    }
    for x in x3s {
        transcript.append_point(x);
    }
    for x in x4s {
        transcript.append_point(x);
    }
    transcript.append_point(x5);
    for x in x6s {
        transcript.append_point(x);
    }
    for xs in auditor_xs {
        for x in xs {
            transcript.append_point(x);
        }
    }
    transcript.challenge()
}

/// Key-rotation challenge: old and new key, old and new balance, then the
/// commitments.
#[allow(clippy::too_many_arguments)]
pub fn rotation_challenge(
    old_key: &EncryptionKey,
    new_key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &CompressedRistretto,
    x2s: &[CompressedRistretto; CHUNK_COUNT],
    x3s: &[CompressedRistretto; CHUNK_COUNT],
    x4: &CompressedRistretto,
) -> Scalar {
    let mut transcript = SigmaTranscript::new(dst::ROTATION);
    transcript.append_encryption_key(old_key);
    transcript.append_encryption_key(new_key);
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_point(x1);
    for x in x2s {
        transcript.append_point(x);
    }
    for x in x3s {
        transcript.append_point(x);
    }
    transcript.append_point(x4);
    transcript.challenge()
}

/// Normalization challenge: the key, unnormalized and normalized balance,
/// then the commitments.
pub fn normalization_challenge(
    key: &EncryptionKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &CompressedRistretto,
    x2s: &[CompressedRistretto; CHUNK_COUNT],
    x3s: &[CompressedRistretto; CHUNK_COUNT],
    x4: &CompressedRistretto,
) -> Scalar {
    let mut transcript = SigmaTranscript::new(dst::NORMALIZATION);
    transcript.append_encryption_key(key);
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_point(x1);
    for x in x2s {
        transcript.append_point(x);
    }
    for x in x3s {
        transcript.append_point(x);
    }
    transcript.append_point(x4);
    transcript.challenge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ristretto::{random_scalar, G};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn challenge_is_deterministic() {
        let mut rng = ChaCha20Rng::from_seed([31u8; 32]);
        let point = (random_scalar(&mut rng) * *G).compress();

        let derive = || {
            let mut transcript = SigmaTranscript::new(dst::WITHDRAWAL);
            transcript.append_point(&point);
            transcript.challenge()
        };
        assert_eq!(derive(), derive());
    }

    #[test]
    fn challenge_depends_on_dst_and_inputs() {
        let mut rng = ChaCha20Rng::from_seed([32u8; 32]);
        let point = (random_scalar(&mut rng) * *G).compress();
        let other = (random_scalar(&mut rng) * *G).compress();

        let derive = |tag: &'static [u8], p: &CompressedRistretto| {
            let mut transcript = SigmaTranscript::new(tag);
            transcript.append_point(p);
            transcript.challenge()
        };
        assert_ne!(
            derive(dst::WITHDRAWAL, &point),
            derive(dst::TRANSFER, &point)
        );
        assert_ne!(
            derive(dst::WITHDRAWAL, &point),
            derive(dst::WITHDRAWAL, &other)
        );
    }
}
