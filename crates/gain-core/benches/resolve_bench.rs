//! Criterion benchmarks for topic resolution and the payload codec.
//!
//! Both run on every knob movement and every controller broadcast, so they
//! should stay well under a microsecond.
//!
//! Run with:
//! ```bash
//! cargo bench --package gain-core --bench resolve_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gain_core::{decode_gain_vector, encode_knob_value, resolve, GainVector};

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    group.bench_function("valid", |b| b.iter(|| resolve(black_box("posxp"))));
    group.bench_function("valid_uppercase", |b| b.iter(|| resolve(black_box("ATTZD"))));
    group.bench_function("unknown_group", |b| b.iter(|| resolve(black_box("xyz12"))));

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    group.bench_function("encode_knob_value", |b| {
        b.iter(|| encode_knob_value(black_box(1.5)))
    });

    let payload = serde_json_payload();
    group.bench_function("decode_gain_vector", |b| {
        b.iter(|| decode_gain_vector(black_box(&payload)))
    });

    group.finish();
}

fn serde_json_payload() -> Vec<u8> {
    let gains = GainVector {
        kp: [0.8, 0.8, 1.2],
        ki: [0.05, 0.05, 0.1],
        kd: [0.2, 0.2, 0.0],
    };
    gain_core::encode_gain_vector(&gains).unwrap_or_default()
}

criterion_group!(benches, bench_resolve, bench_codec);
criterion_main!(benches);
