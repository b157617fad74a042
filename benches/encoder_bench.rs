//! Criterion benchmark untuk batching dan encoding
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hermes_batch::config::EncoderConfig;
use hermes_batch::core::{Fields, LengthOnly, Update, UpdateBatch};
use hermes_batch::protocol::MessageEncoder;

fn make_updates(count: usize) -> Vec<Update> {
    (0..count)
        .map(|i| {
            let mut fields = Fields::with_capacity(10);
            for f in 0..10 {
                fields.insert(format!("field{}", f), LengthOnly(100));
            }
            Update::new("usertable", format!("user{}", i), fields)
        })
        .collect()
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_batch");
    group.throughput(Throughput::Elements(1));

    // Append + drain setiap batch penuh
    group.bench_function("append_drain_cycle", |b| {
        let mut batch = UpdateBatch::new(1000).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            if batch.is_full() {
                black_box(batch.drain());
            }
            let update = Update::new("usertable", "user", Fields::new().with("f", LengthOnly(i as i64)));
            black_box(batch.append(update).unwrap());
            i = i.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoder");
    let encoder = MessageEncoder::new(EncoderConfig::default());

    for batch_size in [10, 100, 1000].iter() {
        let updates = make_updates(*batch_size);
        group.throughput(Throughput::Elements(*batch_size as u64));

        group.bench_function(format!("build_payload_{}", batch_size), |b| {
            b.iter(|| black_box(encoder.build_payload(black_box(&updates)).unwrap()));
        });

        let payload = encoder.build_payload(&updates).unwrap();
        group.bench_function(format!("frame_{}", batch_size), |b| {
            b.iter(|| black_box(encoder.frame(black_box(&payload)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch, bench_encode);
criterion_main!(benches);
