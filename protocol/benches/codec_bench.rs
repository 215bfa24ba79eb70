// Secure payload codec benchmarks.
//
// Covers key agreement, encode and decode at SWIFT-typical message sizes,
// and transfer signing with an attached payload.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use swiftbridge_protocol::config::BridgeConfig;
use swiftbridge_protocol::crypto::{shared_secret, KeyPair};
use swiftbridge_protocol::time::FixedTimeProvider;
use swiftbridge_protocol::{attach_from, Account, SecurePayloadCodec, TransactionAssembler};

const SIZES: [usize; 4] = [256, 2 * 1024, 16 * 1024, 64 * 1024];

/// Repetitive field-tagged text, compressing roughly like real MT traffic.
fn swift_like(len: usize) -> Vec<u8> {
    ":61:160827C642,S1032\n:86:TRANSFER REF 000123\n"
        .bytes()
        .cycle()
        .take(len)
        .collect()
}

fn bench_key_agreement(c: &mut Criterion) {
    let a = KeyPair::generate();
    let b = KeyPair::generate().public_key();

    c.bench_function("agreement/shared_secret", |bench| {
        bench.iter(|| shared_secret(&a, &b));
    });
}

fn bench_encode(c: &mut Criterion) {
    let codec = SecurePayloadCodec::default();
    let a = KeyPair::generate();
    let b = KeyPair::generate().public_key();
    let mut group = c.benchmark_group("codec/encode");

    for size in SIZES {
        let payload = swift_like(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |bench, p| {
            bench.iter(|| codec.encode(&a, &b, p));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let codec = SecurePayloadCodec::default();
    let a = KeyPair::generate();
    let b = KeyPair::generate();
    let mut group = c.benchmark_group("codec/decode");

    for size in SIZES {
        let blob = codec
            .encode(&a, &b.public_key(), &swift_like(size))
            .expect("encode");
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &blob, |bench, blob| {
            bench.iter(|| codec.decode(&b, &a.public_key(), blob));
        });
    }
    group.finish();
}

fn bench_build_transfer(c: &mut Criterion) {
    let a = KeyPair::generate();
    let b = KeyPair::generate();
    let blob = SecurePayloadCodec::default()
        .encode(&a, &b.public_key(), &swift_like(2 * 1024))
        .expect("encode");
    let attachment = attach_from(Some(blob), &[]).expect("attachment");
    let assembler = TransactionAssembler::new(
        Arc::new(FixedTimeProvider::at_secs(1_700_000_000)),
        &BridgeConfig::default(),
    );

    c.bench_function("transaction/build_with_payload", |bench| {
        bench.iter(|| {
            let mut draft = assembler.draft();
            draft
                .sender(Account::local(a.clone()))
                .and_then(|d| d.recipient(Account::from_public_key(b.public_key())))
                .and_then(|d| d.attachment(attachment.clone()))
                .expect("setters");
            draft.build_transaction()
        });
    });
}

criterion_group!(
    benches,
    bench_key_agreement,
    bench_encode,
    bench_decode,
    bench_build_transfer,
);
criterion_main!(benches);
