//! Batch Encoder dan Segment Framing
//!
//! Dua tahap:
//! 1. `build_payload`: satu pass atas batch ke Cap'n Proto builder
//!    (`System.request -> Update.requests -> [Request]`)
//! 2. `frame`: hitung segment table *setelah* payload jadi, lalu gabungkan
//!
//! Output buffer dialokasikan tepat `table + Σ segment` bytes.

use byteorder::{ByteOrder, LittleEndian};
use capnp::message::{Builder, HeapAllocator};
use tracing::{debug, trace};

use super::segment::{SegmentSource, WORD_BYTES};
use crate::config::{EncoderConfig, ValueEncoding};
use crate::core::{normalized_len, Update};
use crate::error::EncodeError;
use crate::messages_capnp::system;

/// Payload yang sudah dibangun, siap di-frame
pub type Payload = Builder<HeapAllocator>;

/// Batas panjang Data/Text di Cap'n Proto (element count 29 bit)
pub const MAX_BLOB_BYTES: usize = (1 << 29) - 1;

/// Batas jumlah element satu List
pub const MAX_LIST_LEN: usize = (1 << 29) - 1;

/// Batas ukuran segment pada `HeapAllocator`
const MAX_SEGMENT_WORDS: u32 = 1 << 29;

/// Segment table: `[n - 1, len(s0)/8, ..., len(sn-1)/8, (pad)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    words: Vec<u32>,
}

/// Jumlah word table untuk `segment_count` segment, dibulatkan ke genap
#[inline(always)]
pub fn table_words(segment_count: usize) -> usize {
    (segment_count + 2) & !1
}

impl SegmentTable {
    /// Bangun table untuk segments. Setiap segment harus 8-byte aligned.
    pub fn for_segments(segments: &[&[u8]]) -> Result<Self, EncodeError> {
        if segments.is_empty() {
            return Err(EncodeError::EmptySegments);
        }
        let count = u32::try_from(segments.len() - 1).map_err(|_| EncodeError::TooManySegments {
            max: u32::MAX as usize + 1,
        })?;

        let mut words = vec![0u32; table_words(segments.len())];
        words[0] = count;

        for (index, segment) in segments.iter().enumerate() {
            let len = segment.len();
            if len % WORD_BYTES != 0 {
                return Err(EncodeError::MisalignedSegment { index, len });
            }
            let segment_words = len / WORD_BYTES;
            words[index + 1] = u32::try_from(segment_words).map_err(|_| {
                EncodeError::SegmentTooLarge {
                    index,
                    words: segment_words,
                }
            })?;
        }

        Ok(Self { words })
    }

    /// Baca table dari awal `buf`. Returns table dan panjangnya dalam bytes.
    pub fn read_from(buf: &[u8]) -> Result<(Self, usize), EncodeError> {
        if buf.len() < 4 {
            return Err(EncodeError::TruncatedTable {
                needed: 4,
                available: buf.len(),
            });
        }

        let segment_count = LittleEndian::read_u32(buf) as usize + 1;
        let byte_len = table_words(segment_count) * 4;
        if buf.len() < byte_len {
            return Err(EncodeError::TruncatedTable {
                needed: byte_len,
                available: buf.len(),
            });
        }

        let mut words = vec![0u32; byte_len / 4];
        LittleEndian::read_u32_into(&buf[..byte_len], &mut words);
        Ok((Self { words }, byte_len))
    }

    pub fn segment_count(&self) -> usize {
        self.words[0] as usize + 1
    }

    /// Panjang tiap segment dalam words
    pub fn segment_words(&self) -> &[u32] {
        &self.words[1..=self.segment_count()]
    }

    /// Semua word table, termasuk padding
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn byte_len(&self) -> usize {
        self.words.len() * 4
    }

    /// Total bytes semua segment
    pub fn payload_len(&self) -> usize {
        self.segment_words()
            .iter()
            .map(|&w| w as usize * WORD_BYTES)
            .sum()
    }

    fn write_into(&self, out: &mut [u8]) {
        LittleEndian::write_u32_into(&self.words, &mut out[..self.byte_len()]);
    }
}

/// Output framing: table bytes diikuti semua segment, tanpa padding di antaranya
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    table: SegmentTable,
    buffer: Vec<u8>,
}

impl EncodedMessage {
    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.table.segment_count()
    }

    /// Iterasi segment di dalam buffer sesuai table
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut offset = self.table.byte_len();
        self.table.segment_words().iter().map(move |&w| {
            let start = offset;
            offset += w as usize * WORD_BYTES;
            &self.buffer[start..offset]
        })
    }
}

/// Encoder untuk satu batch penuh
///
/// Tidak menyimpan state antar batch; satu instance bisa dipakai berulang.
#[derive(Debug, Clone, Default)]
pub struct MessageEncoder {
    config: EncoderConfig,
}

impl MessageEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Bangun `System { request: Update { requests } }` untuk batch.
    ///
    /// Field values ditulis sesuai [`ValueEncoding`]: placeholder menulis
    /// `|remaining_bytes|` bytes nol, content menyalin isi source.
    /// Ukuran value dicek terhadap `max_message_bytes` sebelum dialokasikan.
    pub fn build_payload(&self, updates: &[Update]) -> Result<Payload, EncodeError> {
        check_list_len(updates.len())?;

        let limit = self.config.max_message_bytes;
        let mut value_bytes = 0usize;
        for update in updates {
            check_list_len(update.fields.len())?;
            for (_, source) in update.fields.iter() {
                let len = match self.config.value_encoding {
                    ValueEncoding::Placeholder => {
                        usize::try_from(normalized_len(source)).unwrap_or(usize::MAX)
                    }
                    ValueEncoding::Content => source.content().len(),
                };
                if len > MAX_BLOB_BYTES {
                    return Err(EncodeError::BlobTooLarge { len });
                }
                value_bytes = value_bytes.saturating_add(len);
                if value_bytes > limit {
                    return Err(EncodeError::PayloadTooLarge {
                        size: value_bytes,
                        limit,
                    });
                }
            }
        }

        let first_segment_words = self
            .config
            .first_segment_words
            .clamp(1, MAX_SEGMENT_WORDS as usize) as u32;
        let mut message =
            Builder::new(HeapAllocator::new().first_segment_words(first_segment_words));

        let mut requests = message
            .init_root::<system::Builder>()
            .init_request()
            .init_requests(updates.len() as u32);

        for (i, update) in updates.iter().enumerate() {
            let mut request = requests.reborrow().get(i as u32);
            check_blob_len(update.table.len())?;
            check_blob_len(update.key.len())?;
            request.set_table(update.table.as_str());
            request.set_key(update.key.as_str());

            let mut values = request.init_values(update.fields.len() as u32);
            for (j, (name, source)) in update.fields.iter().enumerate() {
                let mut value = values.reborrow().get(j as u32);
                check_blob_len(name.len())?;
                value.set_key(name);
                match self.config.value_encoding {
                    ValueEncoding::Placeholder => {
                        // Sudah dicek terhadap MAX_BLOB_BYTES; init selalu zero-filled
                        value.init_value(normalized_len(source) as u32);
                    }
                    ValueEncoding::Content => value.set_value(source.content()),
                }
            }
        }

        debug!(
            updates = updates.len(),
            segments = message.get_segments_for_output().len(),
            "built batch payload"
        );
        Ok(message)
    }

    /// Frame segments dari `message` menjadi satu buffer.
    pub fn frame<S>(&self, message: &S) -> Result<EncodedMessage, EncodeError>
    where
        S: SegmentSource + ?Sized,
    {
        let segments = message.segments_for_output();
        let table = SegmentTable::for_segments(&segments)?;

        let table_len = table.byte_len();
        let size = segments
            .iter()
            .fold(table_len, |acc, s| acc.saturating_add(s.len()));
        if size > self.config.max_message_bytes {
            return Err(EncodeError::PayloadTooLarge {
                size,
                limit: self.config.max_message_bytes,
            });
        }

        let mut buffer = vec![0u8; size];
        table.write_into(&mut buffer);
        let mut offset = table_len;
        for segment in &segments {
            buffer[offset..offset + segment.len()].copy_from_slice(segment);
            offset += segment.len();
        }

        trace!(
            segments = segments.len(),
            table_bytes = table_len,
            total_bytes = size,
            "framed message"
        );
        Ok(EncodedMessage { table, buffer })
    }

    /// `frame(build_payload(updates))`
    pub fn encode(&self, updates: &[Update]) -> Result<EncodedMessage, EncodeError> {
        let payload = self.build_payload(updates)?;
        self.frame(&payload)
    }
}

#[inline(always)]
fn check_blob_len(len: usize) -> Result<(), EncodeError> {
    if len > MAX_BLOB_BYTES {
        return Err(EncodeError::BlobTooLarge { len });
    }
    Ok(())
}

#[inline(always)]
fn check_list_len(len: usize) -> Result<(), EncodeError> {
    if len > MAX_LIST_LEN {
        return Err(EncodeError::ListTooLong { len });
    }
    Ok(())
}
