//! Write path dari workload driver
//!
//! Setiap `update` masuk ke batch. Saat batch penuh: drain, encode, kirim
//! lewat transport, lalu batch siap untuk siklus berikutnya.

use tracing::{debug, warn};

use crate::config::DriverConfig;
use crate::core::{BatchState, Fields, Update, UpdateBatch};
use crate::error::Result;
use crate::network::Transport;
use crate::protocol::MessageEncoder;

/// Status yang dikembalikan ke benchmark harness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Transport gagal mengirim batch. Tidak di-retry.
    Error,
}

/// Driver statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriverStats {
    pub updates: u64,
    pub batches: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    /// Update yang ikut terbuang bersama batch-nya: encode gagal atau
    /// transport gagal mengirim.
    pub dropped: u64,
}

pub struct WriteDriver<T> {
    batch: UpdateBatch,
    encoder: MessageEncoder,
    transport: T,
    stats: DriverStats,
}

impl<T: Transport> WriteDriver<T> {
    pub fn new(config: DriverConfig, transport: T) -> Result<Self> {
        Ok(Self {
            batch: UpdateBatch::with_config(config.batch)?,
            encoder: MessageEncoder::new(config.encoder),
            transport,
            stats: DriverStats::default(),
        })
    }

    /// Satu write call dari harness.
    ///
    /// Encoding error dikembalikan sebagai `Err`; kegagalan transport
    /// dilaporkan sebagai [`Status::Error`]. Dalam dua kasus itu batch yang
    /// sudah di-drain dibuang dan dihitung di [`DriverStats::dropped`].
    pub fn update(
        &mut self,
        table: impl Into<String>,
        key: impl Into<String>,
        fields: Fields,
    ) -> Result<Status> {
        let state = self.batch.append(Update::new(table, key, fields))?;
        self.stats.updates += 1;

        match state {
            BatchState::Filling => Ok(Status::Ok),
            BatchState::Full => self.flush(),
        }
    }

    fn flush(&mut self) -> Result<Status> {
        let updates = self.batch.drain();
        let message = match self.encoder.encode(&updates) {
            Ok(message) => message,
            Err(e) => {
                self.stats.dropped += updates.len() as u64;
                warn!(error = %e, dropped = updates.len(), "failed to encode batch");
                return Err(e.into());
            }
        };
        self.stats.batches += 1;

        debug!(
            updates = updates.len(),
            bytes = message.len(),
            segments = message.segment_count(),
            "calling service"
        );

        match self.transport.send(&message) {
            Ok(()) => {
                self.stats.bytes_sent += message.len() as u64;
                Ok(Status::Ok)
            }
            Err(e) => {
                self.stats.send_errors += 1;
                self.stats.dropped += updates.len() as u64;
                warn!(error = %e, dropped = updates.len(), "failed to send batch");
                Ok(Status::Error)
            }
        }
    }

    /// Update yang belum mencapai batch penuh
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
