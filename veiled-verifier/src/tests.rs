//! End-to-end tests against the prover. Covered:
//!   1) Happy paths for the four authorizations, with literal balances
//!   2) Soundness probes: tampered sigma and range proof bytes are rejected
//!   3) Auditor binding: substituted keys or handles are rejected
//!   4) Fiat–Shamir sensitivity: any altered public input is rejected
//!   5) Normalization idempotence on an already-normalized balance

use crate::*;
use curve25519_dalek::scalar::Scalar;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use veiled_primitives::{
    combine_chunks, is_normalized, random_scalar, split_balance, EncryptedBalance, Keypair,
    CHUNK_COUNT, CHUNK_WINDOW,
};
use veiled_prover::{
    AuthorizationBuilder, BulletproofRangeProver, KeyRotationProver, NormalizationProver,
    TransferProver, WithdrawProver,
};

fn balance_for(pair: &Keypair, value: u128, seed: u8) -> EncryptedBalance {
    let mut rng = ChaCha20Rng::from_seed([seed; 32]);
    let randomness: [Scalar; CHUNK_COUNT] = core::array::from_fn(|_| random_scalar(&mut rng));
    EncryptedBalance::encrypt_with(pair.encryption_key(), &split_balance(value), &randomness)
}

#[test]
fn withdraw_happy_path() {
    let alice = Keypair::from_seed(&[101u8; 32]);
    let balance = balance_for(&alice, 70, 1);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [2u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_withdrawal(
        alice.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
    assert!(verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &authorization.range_proofs,
    ));
    assert_eq!(
        authorization
            .new_balance
            .decrypt(alice.decryption_key(), CHUNK_WINDOW),
        Ok(55)
    );
}

#[test]
fn withdraw_large_balance() {
    let alice = Keypair::from_seed(&[102u8; 32]);
    let balance = balance_for(&alice, (1 << 64) + 100, 3);
    let amount = (1 << 32) + 10;

    let prover =
        WithdrawProver::new(alice.decryption_key(), &balance, amount, [4u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_withdrawal(
        alice.encryption_key(),
        &balance,
        amount,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
    assert!(verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &authorization.range_proofs,
    ));
    assert_eq!(
        authorization
            .new_balance
            .decrypt(alice.decryption_key(), CHUNK_WINDOW),
        Ok((1 << 64) - (1 << 32) + 90)
    );
}

#[test]
fn transfer_happy_path() {
    let alice = Keypair::from_seed(&[103u8; 32]);
    let bob = Keypair::from_seed(&[104u8; 32]);
    let balance = balance_for(&alice, 70, 5);

    let prover = TransferProver::new(
        alice.decryption_key(),
        &balance,
        bob.encryption_key(),
        10,
        &[],
        [6u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_transfer(
        alice.encryption_key(),
        bob.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[],
        &[],
        &authorization.sigma_proof,
    ));
    let (amount_proofs, balance_proofs) = authorization.range_proofs.split_at(CHUNK_COUNT);
    assert!(verify_amount_range_proofs::<BulletproofRangeVerifier>(
        &authorization.amount_ciphertexts,
        amount_proofs,
    ));
    assert!(verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        balance_proofs,
    ));

    assert_eq!(
        authorization
            .amount_ciphertexts
            .decrypt(bob.decryption_key(), CHUNK_WINDOW),
        Ok(10)
    );
    assert_eq!(
        authorization
            .new_balance
            .decrypt(alice.decryption_key(), CHUNK_WINDOW),
        Ok(60)
    );
}

#[test]
fn transfer_with_auditor_binds_the_auditor() {
    let alice = Keypair::from_seed(&[105u8; 32]);
    let bob = Keypair::from_seed(&[106u8; 32]);
    let auditor = Keypair::from_seed(&[107u8; 32]);
    let outsider = Keypair::from_seed(&[108u8; 32]);
    let balance = balance_for(&alice, 70, 7);

    let prover = TransferProver::new(
        alice.decryption_key(),
        &balance,
        bob.encryption_key(),
        10,
        &[*auditor.encryption_key()],
        [8u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();
    let handles = authorization.auditor_handles.clone();

    assert!(verify_transfer(
        alice.encryption_key(),
        bob.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[*auditor.encryption_key()],
        &handles,
        &authorization.sigma_proof,
    ));

    // substituting the auditor key must fail
    assert!(!verify_transfer(
        alice.encryption_key(),
        bob.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[*outsider.encryption_key()],
        &handles,
        &authorization.sigma_proof,
    ));

    // tampering with a handle must fail
    let mut bad_handles = handles.clone();
    bad_handles[0][0] = *outsider.encryption_key().as_point();
    assert!(!verify_transfer(
        alice.encryption_key(),
        bob.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[*auditor.encryption_key()],
        &bad_handles,
        &authorization.sigma_proof,
    ));

    // omitting the auditor entirely must fail
    assert!(!verify_transfer(
        alice.encryption_key(),
        bob.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[],
        &[],
        &authorization.sigma_proof,
    ));
}

#[test]
fn key_rotation_happy_path() {
    let alice_old = Keypair::from_seed(&[109u8; 32]);
    let alice_new = Keypair::from_seed(&[110u8; 32]);
    let balance = balance_for(&alice_old, 70, 9);

    let prover = KeyRotationProver::new(
        alice_old.decryption_key(),
        alice_new.decryption_key(),
        &balance,
        [10u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_rotation(
        alice_old.encryption_key(),
        alice_new.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
    assert!(verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &authorization.range_proofs,
    ));

    assert_eq!(
        authorization
            .new_balance
            .decrypt(alice_new.decryption_key(), CHUNK_WINDOW),
        Ok(70)
    );
    assert!(authorization
        .new_balance
        .decrypt(alice_old.decryption_key(), 0..1000)
        .is_err());

    // swapping the key assignment must fail
    assert!(!verify_rotation(
        alice_new.encryption_key(),
        alice_old.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
}

#[test]
fn normalization_happy_path() {
    let alice = Keypair::from_seed(&[111u8; 32]);
    let chunks = [(1u64 << 32) + 100, (1 << 32) + 200, (1 << 32) + 300, 0];
    let value = combine_chunks(&chunks).unwrap();
    let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
    let randomness: [Scalar; CHUNK_COUNT] = core::array::from_fn(|_| random_scalar(&mut rng));
    let balance = EncryptedBalance::encrypt_with(alice.encryption_key(), &chunks, &randomness);

    let prover = NormalizationProver::new(
        alice.decryption_key(),
        &balance,
        0..1 << 33,
        [12u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_normalization(
        alice.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
    assert!(verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &authorization.range_proofs,
    ));

    let normalized = authorization
        .new_balance
        .decrypt_chunks(alice.decryption_key(), CHUNK_WINDOW)
        .unwrap();
    assert!(is_normalized(&normalized));
    assert_eq!(combine_chunks(&normalized), Some(value));
}

#[test]
fn normalization_is_idempotent() {
    let alice = Keypair::from_seed(&[112u8; 32]);
    let balance = balance_for(&alice, 70, 13);

    let prover =
        NormalizationProver::new(alice.decryption_key(), &balance, CHUNK_WINDOW, [14u8; 32])
            .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(verify_normalization(
        alice.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));
    assert_eq!(
        authorization
            .new_balance
            .decrypt(alice.decryption_key(), CHUNK_WINDOW),
        Ok(70)
    );
}

#[test]
fn flipped_sigma_bytes_never_verify() {
    let alice = Keypair::from_seed(&[113u8; 32]);
    let balance = balance_for(&alice, 70, 15);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [16u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();
    let bytes = authorization.sigma_proof.to_bytes();

    assert!(verify_withdrawal_bytes(
        alice.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &bytes,
    ));

    // sample a byte of every 32-byte field, plus both ends
    for offset in (0..bytes.len()).step_by(29).chain([bytes.len() - 1]) {
        let mut tampered = bytes.clone();
        tampered[offset] ^= 0x01;
        assert!(
            !verify_withdrawal_bytes(
                alice.encryption_key(),
                &balance,
                15,
                &authorization.new_balance,
                &tampered,
            ),
            "flip at offset {offset} was accepted"
        );
    }
}

#[test]
fn flipped_range_proof_bytes_never_verify() {
    let alice = Keypair::from_seed(&[114u8; 32]);
    let balance = balance_for(&alice, 70, 17);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [18u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    let mut tampered = authorization.range_proofs.clone();
    let last = tampered[2].len() - 1;
    tampered[2][last] ^= 0x01;
    assert!(!verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &tampered,
    ));
}

#[test]
fn malformed_proof_bytes_never_verify() {
    let alice = Keypair::from_seed(&[115u8; 32]);
    let balance = balance_for(&alice, 70, 19);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [20u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();
    let bytes = authorization.sigma_proof.to_bytes();

    // truncated, extended, and off-stride lengths
    assert!(!verify_withdrawal_bytes(
        alice.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &bytes[..bytes.len() - 1],
    ));
    let mut longer = bytes.clone();
    longer.extend_from_slice(&[0u8; 32]);
    assert!(!verify_withdrawal_bytes(
        alice.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &longer,
    ));
    assert!(!verify_withdrawal_bytes(
        alice.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &[],
    ));
}

#[test]
fn fiat_shamir_binds_every_public_input() {
    let alice = Keypair::from_seed(&[116u8; 32]);
    let mallory = Keypair::from_seed(&[117u8; 32]);
    let balance = balance_for(&alice, 70, 21);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [22u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    // wrong amount
    assert!(!verify_withdrawal(
        alice.encryption_key(),
        &balance,
        16,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));

    // wrong key
    assert!(!verify_withdrawal(
        mallory.encryption_key(),
        &balance,
        15,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));

    // tampered current-balance ciphertext
    let mut tampered = balance;
    tampered.0[0] = tampered.0[0].add_amount(1);
    assert!(!verify_withdrawal(
        alice.encryption_key(),
        &tampered,
        15,
        &authorization.new_balance,
        &authorization.sigma_proof,
    ));

    // tampered new-balance ciphertext
    let mut tampered = authorization.new_balance;
    tampered.0[3] = tampered.0[3].add_amount(1);
    assert!(!verify_withdrawal(
        alice.encryption_key(),
        &balance,
        15,
        &tampered,
        &authorization.sigma_proof,
    ));
}

#[test]
fn transfer_rejects_swapped_parties() {
    let alice = Keypair::from_seed(&[118u8; 32]);
    let bob = Keypair::from_seed(&[119u8; 32]);
    let balance = balance_for(&alice, 70, 23);

    let prover = TransferProver::new(
        alice.decryption_key(),
        &balance,
        bob.encryption_key(),
        10,
        &[],
        [24u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    assert!(!verify_transfer(
        bob.encryption_key(),
        alice.encryption_key(),
        &balance,
        &authorization.new_balance,
        &authorization.amount_ciphertexts,
        &[],
        &[],
        &authorization.sigma_proof,
    ));
}

#[test]
fn range_proofs_reject_mismatched_bases() {
    let alice = Keypair::from_seed(&[120u8; 32]);
    let balance = balance_for(&alice, 70, 25);

    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 15, [26u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    // new-balance proofs are bound to (G, D'_i); checking them against
    // (G, H) must fail
    assert!(!verify_amount_range_proofs::<BulletproofRangeVerifier>(
        &authorization.new_balance,
        &authorization.range_proofs[..CHUNK_COUNT],
    ));
}
