//! Bounded discrete-log recovery in the exponent of `G`.
//!
//! Decryption of a twisted ElGamal ciphertext ends with a point `M = m·G`
//! and a caller-supplied window `[lo, hi)` known to contain `m`. Chunked
//! balances keep the windows small: a normalized chunk fits in 32 bits, an
//! overflowed one in 64. Recovery is baby-step/giant-step over the window;
//! the baby table is built once per process and shared.

use std::collections::HashMap;
use std::ops::Range;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use lazy_static::lazy_static;

use crate::ristretto::G;

/// Number of baby steps; a full 32-bit chunk window costs at most this many
/// giant steps.
const BABY_STEPS: u64 = 1 << 16;

lazy_static! {
    static ref BABY_TABLE: HashMap<[u8; 32], u64> = {
        let mut table = HashMap::with_capacity(BABY_STEPS as usize);
        let mut point = RistrettoPoint::identity();
        for j in 0..BABY_STEPS {
            table.insert(point.compress().to_bytes(), j);
            point += *G;
        }
        table
    };
    static ref GIANT_STEP: RistrettoPoint = Scalar::from(BABY_STEPS) * *G;
}

/// Recover `m` in `window` such that `point == m·G`, or `None` if the window
/// is exhausted.
///
/// The identity is short-circuited to `m = 0` when the window allows it.
pub fn recover(point: &RistrettoPoint, window: Range<u64>) -> Option<u64> {
    if window.is_empty() {
        return None;
    }
    if window.start == 0 && *point == RistrettoPoint::identity() {
        return Some(0);
    }

    let mut target = *point - *G * Scalar::from(window.start);
    let span = window.end - window.start;
    let giants = span.div_ceil(BABY_STEPS);
    for k in 0..giants {
        if let Some(j) = BABY_TABLE.get(target.compress().as_bytes()) {
            let m = window.start + k * BABY_STEPS + j;
            // a hit past the window end can only occur on the last stride
            return (m < window.end).then_some(m);
        }
        target -= *GIANT_STEP;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(m: u64) -> RistrettoPoint {
        *G * Scalar::from(m)
    }

    #[test]
    fn recovers_small_values() {
        for m in [0u64, 1, 2, 55, 70, 1000] {
            assert_eq!(recover(&exp(m), 0..1 << 32), Some(m));
        }
    }

    #[test]
    fn recovers_across_stride_boundaries() {
        for m in [BABY_STEPS - 1, BABY_STEPS, BABY_STEPS + 1, 3 * BABY_STEPS + 17] {
            assert_eq!(recover(&exp(m), 0..1 << 32), Some(m));
        }
    }

    #[test]
    fn respects_window_bounds() {
        assert_eq!(recover(&exp(999), 0..1000), Some(999));
        assert_eq!(recover(&exp(1000), 0..1000), None);
        assert_eq!(recover(&exp(500), 600..1000), None);
        assert_eq!(recover(&exp(700), 600..1000), Some(700));
        assert_eq!(recover(&exp(5), 5..6), Some(5));
        assert_eq!(recover(&exp(5), 5..5), None);
    }

    #[test]
    fn recovers_overflowed_chunk_values() {
        let m = (1u64 << 32) + 300;
        assert_eq!(recover(&exp(m), 0..1 << 33), Some(m));
    }

    #[test]
    fn identity_short_circuit() {
        assert_eq!(recover(&RistrettoPoint::identity(), 0..10), Some(0));
        assert_eq!(recover(&RistrettoPoint::identity(), 1..1000), None);
    }
}
