//! YCSB-style update loader
//!
//! Synthetic update workload: setiap update masuk ke batch, batch penuh
//! di-encode dan dikirim ke remote service (atau null sink untuk dry run).
//!
//! Usage:
//!   cargo run --release --bin ycsb_loader -- [OPTIONS]

use std::net::SocketAddr;
use std::time::Instant;

use hermes_batch::config::{
    BatchConfig, DriverConfig, EncoderConfig, TransportConfig, ValueEncoding,
};
use hermes_batch::core::{Fields, LengthOnly};
use hermes_batch::driver::{Status, WriteDriver};
use hermes_batch::network::{NullTransport, TcpTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Loader configuration
struct LoaderConfig {
    host: Option<SocketAddr>,
    records: usize,
    batch_size: usize,
    field_count: usize,
    field_length: usize,
    content: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            host: None,
            records: 100_000,
            batch_size: BatchConfig::from_env().capacity,
            field_count: 10,
            field_length: 100,
            content: false,
        }
    }
}

/// Field values untuk satu record. Content mode membawa bytes sungguhan.
fn make_fields(config: &LoaderConfig, seed: usize) -> Fields {
    let mut fields = Fields::with_capacity(config.field_count);
    for f in 0..config.field_count {
        let name = format!("field{}", f);
        if config.content {
            let byte = b'a' + ((seed + f) % 26) as u8;
            fields.insert(name, vec![byte; config.field_length]);
        } else {
            fields.insert(name, LengthOnly(config.field_length as i64));
        }
    }
    fields
}

fn run_loader(config: LoaderConfig) -> hermes_batch::Result<()> {
    let transport: Box<dyn Transport> = match config.host {
        Some(addr) => {
            info!(%addr, "connecting to service");
            Box::new(TcpTransport::connect(addr, TransportConfig::default())?)
        }
        None => {
            info!("no --host given, using null transport");
            Box::new(NullTransport::new())
        }
    };

    let driver_config = DriverConfig {
        batch: BatchConfig::new(config.batch_size),
        encoder: EncoderConfig {
            value_encoding: if config.content {
                ValueEncoding::Content
            } else {
                ValueEncoding::Placeholder
            },
            ..EncoderConfig::default()
        },
    };
    let mut driver = WriteDriver::new(driver_config, transport)?;

    println!("🚀 YCSB Loader");
    println!("==============\n");
    println!(
        "  Records: {} | Batch: {} | Fields: {} x {} bytes | Mode: {}",
        config.records,
        config.batch_size,
        config.field_count,
        config.field_length,
        if config.content { "content" } else { "placeholder" }
    );

    let start = Instant::now();
    for i in 0..config.records {
        let fields = make_fields(&config, i);
        if driver.update("usertable", format!("user{}", i), fields)? == Status::Error {
            error!(record = i, "batch send failed");
        }
    }
    let elapsed = start.elapsed();

    let stats = driver.stats();
    println!("\n📊 Loader Stats ({:.2}s)", elapsed.as_secs_f64());
    println!(
        "   Updates:      {} ({:.1}/sec)",
        stats.updates,
        stats.updates as f64 / elapsed.as_secs_f64()
    );
    println!("   Batches:      {}", stats.batches);
    println!("   Pending:      {}", driver.pending());
    println!("   Bytes sent:   {} KB", stats.bytes_sent / 1024);
    if stats.send_errors > 0 {
        println!("   Send errors:  {} ⚠️", stats.send_errors);
    }
    if stats.dropped > 0 {
        println!("   Dropped:      {} updates ⚠️", stats.dropped);
    }

    Ok(())
}

fn parse_args() -> LoaderConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = LoaderConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" | "-H" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(addr) => config.host = Some(addr),
                        Err(e) => eprintln!("⚠️ Invalid --host {}: {}", args[i + 1], e),
                    }
                    i += 1;
                }
            }
            "--records" | "-n" => {
                if i + 1 < args.len() {
                    config.records = args[i + 1].parse().unwrap_or(config.records);
                    i += 1;
                }
            }
            "--batch-size" | "-b" => {
                if i + 1 < args.len() {
                    config.batch_size = args[i + 1].parse().unwrap_or(config.batch_size);
                    i += 1;
                }
            }
            "--fields" => {
                if i + 1 < args.len() {
                    config.field_count = args[i + 1].parse().unwrap_or(config.field_count);
                    i += 1;
                }
            }
            "--field-length" => {
                if i + 1 < args.len() {
                    config.field_length = args[i + 1].parse().unwrap_or(config.field_length);
                    i += 1;
                }
            }
            "--content" => {
                config.content = true;
            }
            "--help" | "-h" => {
                println!("YCSB Loader - batched update workload\n");
                println!("Usage: ycsb_loader [OPTIONS]\n");
                println!("Options:");
                println!("  -H, --host <ADDR>         Service address (default: null transport)");
                println!("  -n, --records <N>         Number of updates (default: 100000)");
                println!("  -b, --batch-size <N>      Updates per batch (default: $BATCH_SIZE or 1000)");
                println!("      --fields <N>          Fields per update (default: 10)");
                println!("      --field-length <N>    Bytes per field (default: 100)");
                println!("      --content             Carry field bytes instead of zero placeholders");
                println!("  -h, --help                Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = parse_args();

    if let Err(e) = run_loader(config) {
        eprintln!("❌ Loader error: {}", e);
        std::process::exit(1);
    }
}
