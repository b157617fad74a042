//! Fixed-Capacity Update Batch
//!
//! State machine dua state: `Filling` -> `Full` -> (drain) -> `Filling`.
//! Storage dialokasikan sekali saat inisialisasi dan hanya di-clear setelah
//! drain, tidak di-realokasi.

use parking_lot::Mutex;

use super::update::Update;
use crate::config::BatchConfig;
use crate::error::BatchError;

/// State batch setelah sebuah operasi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Filling,
    Full,
}

/// Accumulator untuk tepat `capacity` update
#[derive(Debug)]
pub struct UpdateBatch {
    items: Vec<Update>,
    capacity: usize,
}

impl UpdateBatch {
    /// Membuat batch baru. Capacity nol ditolak.
    pub fn new(capacity: usize) -> Result<Self, BatchError> {
        Self::with_config(BatchConfig::new(capacity))
    }

    pub fn with_config(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self {
            items: Vec::with_capacity(config.capacity),
            capacity: config.capacity,
        })
    }

    /// Tambah update ke slot berikutnya.
    ///
    /// Returns [`BatchState::Full`] tepat ketika batch baru saja penuh.
    /// Append ke batch yang sudah penuh adalah contract violation: update
    /// dikembalikan di dalam [`BatchError::CapacityExceeded`] dan isi batch
    /// tidak berubah.
    #[inline]
    pub fn append(&mut self, update: Update) -> Result<BatchState, BatchError> {
        if self.is_full() {
            return Err(BatchError::CapacityExceeded {
                capacity: self.capacity,
                rejected: Box::new(update),
            });
        }

        self.items.push(update);
        Ok(self.state())
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    #[inline(always)]
    pub fn state(&self) -> BatchState {
        if self.is_full() {
            BatchState::Full
        } else {
            BatchState::Filling
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending updates, dalam urutan append
    pub fn items(&self) -> &[Update] {
        &self.items
    }

    /// Ambil semua isi batch dan kembali ke `Filling` dengan nol item.
    ///
    /// Storage internal tetap dipertahankan untuk siklus berikutnya.
    pub fn drain(&mut self) -> Vec<Update> {
        let mut out = Vec::with_capacity(self.items.len());
        out.extend(self.items.drain(..));
        out
    }
}

/// [`UpdateBatch`] yang dipakai bersama oleh beberapa driver thread
///
/// `append` dan `drain` berjalan di bawah mutex yang sama, jadi drain tidak
/// pernah interleave dengan append yang sedang berjalan.
#[derive(Debug)]
pub struct SharedUpdateBatch {
    inner: Mutex<UpdateBatch>,
}

impl SharedUpdateBatch {
    pub fn new(capacity: usize) -> Result<Self, BatchError> {
        Ok(Self {
            inner: Mutex::new(UpdateBatch::new(capacity)?),
        })
    }

    pub fn append(&self, update: Update) -> Result<BatchState, BatchError> {
        self.inner.lock().append(update)
    }

    pub fn drain(&self) -> Vec<Update> {
        self.inner.lock().drain()
    }

    /// Append lalu drain jika batch jadi penuh, dalam satu lock.
    ///
    /// Thread yang membuat batch penuh adalah satu-satunya yang menerima isinya.
    pub fn append_and_take_if_full(
        &self,
        update: Update,
    ) -> Result<Option<Vec<Update>>, BatchError> {
        let mut batch = self.inner.lock();
        match batch.append(update)? {
            BatchState::Full => Ok(Some(batch.drain())),
            BatchState::Filling => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::update::{Fields, LengthOnly};
    use std::sync::Arc;
    use std::thread;

    fn update(key: &str) -> Update {
        Update::new("usertable", key, Fields::new().with("field0", LengthOnly(10)))
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            UpdateBatch::new(0),
            Err(BatchError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_capacity_one_full_after_single_append() {
        let mut batch = UpdateBatch::new(1).unwrap();
        assert_eq!(batch.state(), BatchState::Filling);

        assert_eq!(batch.append(update("user1")).unwrap(), BatchState::Full);
        assert!(batch.is_full());
    }

    #[test]
    fn test_fill_drain_cycle() {
        let mut batch = UpdateBatch::new(3).unwrap();

        for round in 0..5 {
            assert_eq!(batch.append(update("a")).unwrap(), BatchState::Filling);
            assert_eq!(batch.append(update("b")).unwrap(), BatchState::Filling);
            assert_eq!(batch.append(update("c")).unwrap(), BatchState::Full);

            let drained = batch.drain();
            let keys: Vec<_> = drained.iter().map(|u| u.key.as_str()).collect();
            assert_eq!(keys, ["a", "b", "c"], "round {}", round);
            assert!(batch.is_empty());
            assert_eq!(batch.state(), BatchState::Filling);
        }
    }

    #[test]
    fn test_drain_empty_is_idempotent() {
        let mut batch = UpdateBatch::new(4).unwrap();
        assert!(batch.drain().is_empty());
        assert!(batch.drain().is_empty());
        assert_eq!(batch.len(), 0);
        assert_eq!(batch.state(), BatchState::Filling);
    }

    #[test]
    fn test_append_past_capacity_fails_fast() {
        let mut batch = UpdateBatch::new(1).unwrap();
        batch.append(update("user1")).unwrap();

        match batch.append(update("user2")) {
            Err(BatchError::CapacityExceeded { capacity, rejected }) => {
                assert_eq!(capacity, 1);
                assert_eq!(rejected.key, "user2");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Isi batch tidak berubah
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.items()[0].key, "user1");
    }

    #[test]
    fn test_shared_batch_no_lost_or_duplicated_updates() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 250;

        let batch = Arc::new(SharedUpdateBatch::new(7).unwrap());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let batch = Arc::clone(&batch);
                thread::spawn(move || {
                    let mut taken = Vec::new();
                    for i in 0..PER_THREAD {
                        let key = format!("user{}-{}", t, i);
                        if let Some(full) = batch.append_and_take_if_full(update(&key)).unwrap() {
                            assert_eq!(full.len(), 7);
                            taken.extend(full.into_iter().map(|u| u.key));
                        }
                    }
                    taken
                })
            })
            .collect();

        let mut keys: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        keys.extend(batch.drain().into_iter().map(|u| u.key));

        assert_eq!(keys.len(), THREADS * PER_THREAD);
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), THREADS * PER_THREAD);
    }
}
