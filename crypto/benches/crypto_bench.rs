use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tradepost_crypto::{SigningKey, TokenSigner};

fn hmac_sign_bench(c: &mut Criterion) {
    let signer = TokenSigner::new(SigningKey::generate());
    let payload = [42u8; 128];

    c.bench_function("hmac_sha256_sign_128B", |b| {
        b.iter(|| signer.sign(black_box(&payload)))
    });
}

fn hmac_verify_bench(c: &mut Criterion) {
    let signer = TokenSigner::new(SigningKey::generate());
    let payload = [42u8; 128];
    let sig = signer.sign(&payload);

    c.bench_function("hmac_sha256_verify_128B", |b| {
        b.iter(|| signer.verify(black_box(&payload), &sig.0))
    });
}

fn nonce_bench(c: &mut Criterion) {
    c.bench_function("generate_nonce", |b| b.iter(tradepost_crypto::generate_nonce));
}

criterion_group!(benches, hmac_sign_bench, hmac_verify_bench, nonce_bench);
criterion_main!(benches);
