//! Group generators and scalar helpers.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use lazy_static::lazy_static;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha512;

/// Label hashed to the curve to derive the independent generator `H`.
pub const H_LABEL: &[u8] = b"AptosVeiledCoin/TwistedElGamal/H";

lazy_static! {
    /// The Ristretto255 base point.
    pub static ref G: RistrettoPoint = RISTRETTO_BASEPOINT_POINT;
    /// Independent generator with unknown discrete log relative to `G`.
    ///
    /// Derived by hashing [`H_LABEL`] to the curve; the derivation must match
    /// the on-chain verifier bit-for-bit.
    pub static ref H: RistrettoPoint = RistrettoPoint::hash_from_bytes::<Sha512>(H_LABEL);
}

/// Generate a random scalar with full 256-bit entropy.
///
/// Unlike `Scalar::from(rng.next_u64())` which only provides 64 bits of
/// entropy, this uses the full scalar field capacity.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Scalar::from_bytes_mod_order_wide(&bytes)
}

pub fn point_to_bytes(point: &RistrettoPoint) -> [u8; 32] {
    point.compress().to_bytes()
}

pub fn point_from_bytes(bytes: &[u8; 32]) -> Option<RistrettoPoint> {
    CompressedRistretto(*bytes).decompress()
}

/// Canonical little-endian scalar decoding; rejects unreduced encodings.
pub fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::from(Scalar::from_canonical_bytes(*bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::traits::Identity;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn h_is_deterministic() {
        let again = RistrettoPoint::hash_from_bytes::<Sha512>(H_LABEL);
        assert_eq!(*H, again);
    }

    #[test]
    fn h_is_independent_of_g() {
        assert_ne!(*H, *G);
        assert_ne!(*H, RistrettoPoint::identity());
    }

    #[test]
    fn scalar_roundtrip_is_canonical() {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let s = random_scalar(&mut rng);
        assert_eq!(scalar_from_bytes(&s.to_bytes()), Some(s));

        // the group order minus one is canonical, all-ones is not
        assert!(scalar_from_bytes(&[0xffu8; 32]).is_none());
    }

    #[test]
    fn point_roundtrip() {
        let mut rng = ChaCha20Rng::from_seed([4u8; 32]);
        let p = random_scalar(&mut rng) * *G;
        assert_eq!(point_from_bytes(&point_to_bytes(&p)), Some(p));
    }
}
