//! Konfigurasi runtime
//!
//! Semua nilai di-inject saat konstruksi. Tidak ada global state:
//! beberapa encoder dalam satu proses (misalnya di test) tidak saling ganggu.

use std::env::VarError;
use std::time::Duration;

use tracing::warn;

use crate::error::BatchError;

/// Default jumlah update per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Batas atas default output buffer (20 MiB)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 20 * 1024 * 1024;

/// Ukuran segment pertama dalam words (8 KiB)
pub const DEFAULT_FIRST_SEGMENT_WORDS: usize = 1024;

/// Environment variable yang dibaca oleh [`BatchConfig::from_env`].
pub const BATCH_SIZE_ENV: &str = "BATCH_SIZE";

/// Batch configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Baca capacity dari `BATCH_SIZE`, sekali saat startup.
    ///
    /// Tidak di-set = default. Lihat [`BatchConfig::parse`] untuk nilai yang ada.
    pub fn from_env() -> Self {
        match std::env::var(BATCH_SIZE_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(VarError::NotPresent) => Self::default(),
            Err(VarError::NotUnicode(raw)) => {
                warn!(
                    value = ?raw,
                    default = DEFAULT_BATCH_SIZE,
                    "BATCH_SIZE is not valid unicode, using default"
                );
                Self::default()
            }
        }
    }

    /// Parse nilai mentah `BATCH_SIZE`.
    ///
    /// Nilai yang tidak bisa di-parse di-log sebagai warning lalu jatuh ke
    /// default. Capacity nol tetap diteruskan supaya ditolak oleh
    /// [`BatchConfig::validate`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse() {
            Ok(capacity) => Self { capacity },
            Err(err) => {
                warn!(
                    value = raw,
                    error = %err,
                    default = DEFAULT_BATCH_SIZE,
                    "unparsable BATCH_SIZE, using default"
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.capacity == 0 {
            return Err(BatchError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

/// Bagaimana field value dibawa ke wire message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueEncoding {
    /// Hanya panjang value yang dipertahankan; isinya zero-filled.
    #[default]
    Placeholder,
    /// Isi value dari source disalin apa adanya.
    Content,
}

/// Encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub value_encoding: ValueEncoding,
    /// Ukuran maksimum output buffer (table + semua segment)
    pub max_message_bytes: usize,
    pub first_segment_words: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            value_encoding: ValueEncoding::Placeholder,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            first_segment_words: DEFAULT_FIRST_SEGMENT_WORDS,
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub write_timeout: Duration,
    /// SO_SNDBUF (unix only), `None` = biarkan default OS
    pub send_buffer_bytes: Option<usize>,
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(5),
            send_buffer_bytes: Some(256 * 1024), // 256KB
            nodelay: true,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverConfig {
    pub batch: BatchConfig,
    pub encoder: EncoderConfig,
}
