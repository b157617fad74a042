//! Core module: Update batching
//!
//! Prinsip desain:
//! - Fixed capacity: storage dialokasikan sekali saat init
//! - Fail fast: append melewati capacity adalah contract violation
//! - Insertion-ordered fields: urutan wire payload deterministik

mod update;
mod update_batch;

pub use update::{normalized_len, Fields, LengthOnly, Update, ValueSource};
pub use update_batch::{BatchState, SharedUpdateBatch, UpdateBatch};
