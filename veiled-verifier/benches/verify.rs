use criterion::{criterion_group, criterion_main, Criterion};

use curve25519_dalek::scalar::Scalar;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use veiled_primitives::{random_scalar, split_balance, EncryptedBalance, Keypair, CHUNK_COUNT};
use veiled_prover::{
    AuthorizationBuilder, BulletproofRangeProver, TransferProver, WithdrawProver,
};
use veiled_verifier::{
    verify_new_balance_range_proofs, verify_transfer, verify_withdrawal,
    BulletproofRangeVerifier,
};

fn balance_for(pair: &Keypair, value: u128, seed: u8) -> EncryptedBalance {
    let mut rng = ChaCha20Rng::from_seed([seed; 32]);
    let randomness: [Scalar; CHUNK_COUNT] = core::array::from_fn(|_| random_scalar(&mut rng));
    EncryptedBalance::encrypt_with(pair.encryption_key(), &split_balance(value), &randomness)
}

fn bench_withdraw(c: &mut Criterion) {
    let alice = Keypair::from_seed(&[201u8; 32]);
    let balance = balance_for(&alice, 1_000_000, 1);
    let prover = WithdrawProver::new(alice.decryption_key(), &balance, 250, [2u8; 32]).unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    c.bench_function("withdraw/authorize", |b| {
        b.iter(|| prover.authorize::<BulletproofRangeProver>().unwrap())
    });
    c.bench_function("withdraw/verify_sigma", |b| {
        b.iter(|| {
            verify_withdrawal(
                alice.encryption_key(),
                &balance,
                250,
                &authorization.new_balance,
                &authorization.sigma_proof,
            )
        })
    });
    c.bench_function("withdraw/verify_range", |b| {
        b.iter(|| {
            verify_new_balance_range_proofs::<BulletproofRangeVerifier>(
                &authorization.new_balance,
                &authorization.range_proofs,
            )
        })
    });
}

fn bench_transfer(c: &mut Criterion) {
    let alice = Keypair::from_seed(&[202u8; 32]);
    let bob = Keypair::from_seed(&[203u8; 32]);
    let auditor = Keypair::from_seed(&[204u8; 32]);
    let balance = balance_for(&alice, 1_000_000, 3);
    let prover = TransferProver::new(
        alice.decryption_key(),
        &balance,
        bob.encryption_key(),
        777,
        &[*auditor.encryption_key()],
        [4u8; 32],
    )
    .unwrap();
    let authorization = prover.authorize::<BulletproofRangeProver>().unwrap();

    c.bench_function("transfer/authorize", |b| {
        b.iter(|| prover.authorize::<BulletproofRangeProver>().unwrap())
    });
    c.bench_function("transfer/verify_sigma", |b| {
        b.iter(|| {
            verify_transfer(
                alice.encryption_key(),
                bob.encryption_key(),
                &balance,
                &authorization.new_balance,
                &authorization.amount_ciphertexts,
                &[*auditor.encryption_key()],
                &authorization.auditor_handles,
                &authorization.sigma_proof,
            )
        })
    });
}

criterion_group!(benches, bench_withdraw, bench_transfer);
criterion_main!(benches);
