//! Protocol Layer: Segmented Binary Framing
//!
//! Prinsip desain:
//! - Payload dibangun dengan Cap'n Proto builder (`schema/messages.capnp`)
//! - Table setelah payload: segment table dihitung dari segment yang sudah jadi
//! - Exact sizing: output buffer tepat sebesar table + segments, dengan limit eksplisit

mod encoder;
mod segment;

pub use crate::messages_capnp;
pub use encoder::{
    table_words, EncodedMessage, MessageEncoder, Payload, SegmentTable, MAX_BLOB_BYTES,
    MAX_LIST_LEN,
};
pub use segment::{SegmentSource, WORD_BYTES};
