//! Hermes Batch - in-process benchmark
//!
//! Mengukur tiga tahap secara terpisah:
//! - Batching: append + drain
//! - Payload building: Cap'n Proto builder multi-segment
//! - Framing: segment table + concatenation

use std::time::Instant;

use hermes_batch::config::{BatchConfig, EncoderConfig};
use hermes_batch::core::{Fields, LengthOnly, Update, UpdateBatch};
use hermes_batch::protocol::MessageEncoder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FIELD_COUNT: usize = 10;
const FIELD_LEN: i64 = 100;

fn make_update(i: usize) -> Update {
    let mut fields = Fields::with_capacity(FIELD_COUNT);
    for f in 0..FIELD_COUNT {
        fields.insert(format!("field{}", f), LengthOnly(FIELD_LEN));
    }
    Update::new("usertable", format!("user{}", i), fields)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Hermes Batch Encoder - Benchmark");
    println!("===================================\n");

    let batch_config = BatchConfig::from_env();
    info!(capacity = batch_config.capacity, "batch configuration");

    if let Err(e) = run(batch_config) {
        error!(error = %e, "benchmark failed");
        std::process::exit(1);
    }

    println!("\n✅ All benchmarks complete!");
    println!("\nTo stream batches: cargo run --release --bin ycsb_loader -- --host 127.0.0.1:9999");
}

fn run(batch_config: BatchConfig) -> hermes_batch::Result<()> {
    benchmark_batching(batch_config)?;
    benchmark_encoding(batch_config)?;
    Ok(())
}

fn benchmark_batching(config: BatchConfig) -> hermes_batch::Result<()> {
    println!("📊 Batching Benchmark (append + drain)");
    println!("--------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut batch = UpdateBatch::with_config(config)?;

    let updates: Vec<Update> = (0..ITERATIONS)
        .map(|i| Update::new("usertable", format!("user{}", i), Fields::new()))
        .collect();

    let mut flushed = 0usize;
    let start = Instant::now();
    for update in updates {
        if batch.is_full() {
            flushed += batch.drain().len();
        }
        batch.append(update)?;
    }
    let duration = start.elapsed();
    flushed += batch.drain().len();

    let ns = duration.as_nanos() as f64 / ITERATIONS as f64;
    println!("  Capacity: {}", config.capacity);
    println!("  Operations: {} (drained {})", ITERATIONS, flushed);
    println!("  Append latency: {:.2} ns/op", ns);
    println!(
        "  Throughput:     {:.2} M ops/sec\n",
        ITERATIONS as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_encoding(config: BatchConfig) -> hermes_batch::Result<()> {
    println!("📊 Encoding Benchmark (build + frame)");
    println!("-------------------------------------");

    const ROUNDS: usize = 200;
    let encoder = MessageEncoder::new(EncoderConfig::default());
    let updates: Vec<Update> = (0..config.capacity).map(make_update).collect();

    // Build payload
    let start = Instant::now();
    for _ in 0..ROUNDS {
        encoder.build_payload(&updates)?;
    }
    let build_duration = start.elapsed();

    // Frame only
    let payload = encoder.build_payload(&updates)?;
    let start = Instant::now();
    let mut message_len = 0;
    for _ in 0..ROUNDS {
        message_len = encoder.frame(&payload)?.len();
    }
    let frame_duration = start.elapsed();

    let message = encoder.frame(&payload)?;
    let build_us = build_duration.as_micros() as f64 / ROUNDS as f64;
    let frame_us = frame_duration.as_micros() as f64 / ROUNDS as f64;

    println!(
        "  Batch: {} updates x {} fields x {} bytes",
        config.capacity, FIELD_COUNT, FIELD_LEN
    );
    println!(
        "  Message: {} bytes in {} segments (table {} bytes)",
        message_len,
        message.segment_count(),
        message.table().byte_len()
    );
    println!("  Build latency: {:.2} μs/batch", build_us);
    println!("  Frame latency: {:.2} μs/batch", frame_us);
    println!(
        "  Encode throughput: {:.2} M updates/sec",
        (ROUNDS * config.capacity) as f64
            / (build_duration + frame_duration).as_secs_f64()
            / 1_000_000.0
    );
    println!(
        "  Frame throughput:  {:.2} MB/sec",
        (ROUNDS * message_len) as f64 / frame_duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}
