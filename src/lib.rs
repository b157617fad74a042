//! Hermes Batch - Batched Write Encoder
//!
//! Arsitektur:
//! - Core: fixed-capacity update batch (`Filling` -> `Full` -> drain)
//! - Protocol: Cap'n Proto multi-segment payload + segment table framing
//! - Network: transport boundary (TCP via mio, null sink)
//! - Driver: write path yang menyatukan semuanya
//!
//! Wire format satu batch:
//! ```text
//! [u32 LE segment_count - 1][u32 LE len(seg0)/8]...[padding word jika perlu]
//! [seg0 bytes][seg1 bytes]...
//! ```

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod network;
pub mod protocol;

/// Kode hasil `capnpc` dari `schema/messages.capnp`
#[allow(clippy::all, dead_code, unused_parens)]
pub mod messages_capnp {
    include!(concat!(env!("OUT_DIR"), "/messages_capnp.rs"));
}

pub use config::{BatchConfig, DriverConfig, EncoderConfig, TransportConfig, ValueEncoding};
pub use crate::core::{
    BatchState, Fields, LengthOnly, SharedUpdateBatch, Update, UpdateBatch, ValueSource,
};
pub use driver::{DriverStats, Status, WriteDriver};
pub use error::{BatchError, EncodeError, Error, Result};
pub use network::{NullTransport, TcpTransport, Transport};
pub use protocol::{EncodedMessage, MessageEncoder, SegmentSource, SegmentTable};
