//! Segment Source Boundary
//!
//! Framing tidak peduli siapa yang membangun segment. Cukup urutan slice
//! yang masing-masing kelipatan 8 bytes.

use capnp::message::{Allocator, Builder};

/// Ukuran satu word dalam bytes
pub const WORD_BYTES: usize = 8;

/// Sesuatu yang bisa diekspos sebagai urutan segment untuk framing
pub trait SegmentSource {
    /// Segments dalam urutan output. Panjang masing-masing harus kelipatan 8.
    fn segments_for_output(&self) -> Vec<&[u8]>;
}

impl<A: Allocator> SegmentSource for Builder<A> {
    fn segments_for_output(&self) -> Vec<&[u8]> {
        self.get_segments_for_output().to_vec()
    }
}

impl SegmentSource for [&[u8]] {
    fn segments_for_output(&self) -> Vec<&[u8]> {
        self.to_vec()
    }
}

impl SegmentSource for Vec<Vec<u8>> {
    fn segments_for_output(&self) -> Vec<&[u8]> {
        self.iter().map(Vec::as_slice).collect()
    }
}
