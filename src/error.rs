//! Error types untuk batching dan framing.

use thiserror::Error;

use crate::core::Update;

/// Kegagalan pada batch accumulator.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Capacity harus positif, ditolak saat konstruksi.
    #[error("batch capacity must be positive, got {0}")]
    InvalidCapacity(usize),

    /// Append ke batch yang sudah penuh tanpa drain terlebih dahulu.
    ///
    /// Update yang ditolak dikembalikan ke caller.
    #[error("batch capacity exceeded: {capacity} updates already pending")]
    CapacityExceeded {
        capacity: usize,
        rejected: Box<Update>,
    },
}

/// Pelanggaran invariant saat membangun atau mem-frame message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("segment list is empty")]
    EmptySegments,

    /// Builder mengembalikan segment yang tidak 8-byte aligned.
    #[error("segment {index} has length {len}, not a multiple of 8 bytes")]
    MisalignedSegment { index: usize, len: usize },

    #[error("segment {index} spans {words} words, more than a u32 table entry can hold")]
    SegmentTooLarge { index: usize, words: usize },

    #[error("encoded message is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("blob of {len} bytes exceeds the maximum blob size")]
    BlobTooLarge { len: usize },

    #[error("list of {len} elements exceeds the maximum list length")]
    ListTooLong { len: usize },

    #[error("message needs more than {max} segments")]
    TooManySegments { max: usize },

    /// Buffer terlalu pendek untuk segment table yang diklaim.
    #[error("segment table truncated: need {needed} bytes, have {available}")]
    TruncatedTable { needed: usize, available: usize },
}

/// Error utama crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
