//! Update value type dan field value sources
//!
//! Core hanya membaca *remaining byte length* dari setiap value source.
//! Isi value hanya disentuh pada mode [`ValueEncoding::Content`].
//!
//! [`ValueEncoding::Content`]: crate::config::ValueEncoding::Content

use std::fmt;

/// Sumber value untuk satu field
pub trait ValueSource: Send {
    /// Sisa byte yang dilaporkan source. Bisa negatif (sentinel).
    fn remaining_bytes(&self) -> i64;

    /// Isi value, dipakai hanya pada content mode.
    fn content(&self) -> &[u8] {
        &[]
    }
}

/// Source yang hanya melaporkan panjang, tanpa isi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthOnly(pub i64);

impl ValueSource for LengthOnly {
    fn remaining_bytes(&self) -> i64 {
        self.0
    }
}

impl ValueSource for Vec<u8> {
    fn remaining_bytes(&self) -> i64 {
        self.len() as i64
    }

    fn content(&self) -> &[u8] {
        self
    }
}

impl ValueSource for &'static [u8] {
    fn remaining_bytes(&self) -> i64 {
        self.len() as i64
    }

    fn content(&self) -> &[u8] {
        self
    }
}

impl ValueSource for String {
    fn remaining_bytes(&self) -> i64 {
        self.len() as i64
    }

    fn content(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Insertion-ordered field map
///
/// Insert dengan nama yang sudah ada mengganti value di posisi lama,
/// jadi urutan di wire message selalu urutan insert pertama.
#[derive(Default)]
pub struct Fields {
    entries: Vec<(String, Box<dyn ValueSource>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert<V>(&mut self, name: impl Into<String>, value: V)
    where
        V: ValueSource + 'static,
    {
        let name = name.into();
        let value: Box<dyn ValueSource> = Box::new(value);
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert
    pub fn with<V>(mut self, name: impl Into<String>, value: V) -> Self
    where
        V: ValueSource + 'static,
    {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn ValueSource> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ValueSource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k, v.remaining_bytes())))
            .finish()
    }
}

/// Satu write operation dari workload driver
#[derive(Debug)]
pub struct Update {
    pub table: String,
    pub key: String,
    pub fields: Fields,
}

impl Update {
    pub fn new(table: impl Into<String>, key: impl Into<String>, fields: Fields) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            fields,
        }
    }
}

/// Panjang value di wire: nilai absolut dari remaining bytes
#[inline(always)]
pub fn normalized_len(source: &dyn ValueSource) -> u64 {
    source.remaining_bytes().unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_remaining_normalized() {
        assert_eq!(normalized_len(&LengthOnly(-5)), 5);
        assert_eq!(normalized_len(&LengthOnly(10)), 10);
        assert_eq!(normalized_len(&LengthOnly(0)), 0);
        assert_eq!(normalized_len(&LengthOnly(i64::MIN)), 1u64 << 63);
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let fields = Fields::new()
            .with("field2", LengthOnly(2))
            .with("field0", LengthOnly(0))
            .with("field1", LengthOnly(1));

        let names: Vec<_> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["field2", "field0", "field1"]);
    }

    #[test]
    fn test_fields_reinsert_replaces_in_place() {
        let mut fields = Fields::new().with("a", LengthOnly(1)).with("b", LengthOnly(2));
        fields.insert("a", LengthOnly(7));

        assert_eq!(fields.len(), 2);
        let entries: Vec<_> = fields.iter().map(|(k, v)| (k, v.remaining_bytes())).collect();
        assert_eq!(entries, [("a", 7), ("b", 2)]);
    }

    #[test]
    fn test_content_sources() {
        let v = b"abc".to_vec();
        assert_eq!(v.remaining_bytes(), 3);
        assert_eq!(v.content(), b"abc");
        assert!(LengthOnly(4).content().is_empty());
        assert_eq!(String::from("hi").content(), b"hi");
    }
}
