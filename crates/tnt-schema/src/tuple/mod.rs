//! Tuple decoder for `_space` and `_index` select results.
//!
//! A batch is a single MessagePack array whose elements are tuples. Every
//! tuple is decoded positionally. The layouts grew over server releases by
//! appending elements (or replacing flattened trailing elements with nested
//! ones), so everything after the fixed leading elements is read only if it
//! is present.
//!
//! Decoding never trusts declared lengths for allocation and never returns a
//! partial record: a tuple either decodes completely or the whole call fails
//! with a [`DecodeError`] carrying the byte offset where decoding stopped.

mod index;
mod space;

pub use index::{IndexPart, IndexRecord};
pub use space::SpaceRecord;

use serde::Deserialize;
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, SeqAccess};
use tracing::trace;

use crate::error::DecodeError;

/// Upper bound on records preallocated from a batch header.
const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// Which catalog layout a batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleKind {
    SpaceRow,
    IndexRow,
}

/// A read position inside one batch buffer.
pub struct TupleCursor<'a> {
    data: &'a [u8],
    rest: &'a [u8],
}

impl<'a> TupleCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, rest: data }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.data.len() - self.rest.len()
    }

    /// Read the batch header: the number of tuples that follow.
    pub fn read_batch_len(&mut self) -> Result<u32, DecodeError> {
        let offset = self.offset();
        rmp::decode::read_array_len(&mut self.rest)
            .map_err(|e| DecodeError::new(offset, format!("invalid batch header: {e}")))
    }

    /// Check that the batch was consumed completely.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::new(
                self.offset(),
                format!("{} trailing bytes after batch", self.rest.len()),
            ))
        }
    }

    /// Decode the tuple at the cursor as `T`.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T, DecodeError> {
        let result = {
            let mut de = rmp_serde::Deserializer::new(&mut self.rest);
            T::deserialize(&mut de)
        };
        result.map_err(|e| DecodeError::new(self.offset(), e.to_string()))
    }
}

/// Decode a `_space` / `_vspace` select result.
pub fn decode_spaces(data: &[u8]) -> Result<Vec<SpaceRecord>, DecodeError> {
    decode_rows(data, TupleKind::SpaceRow)
}

/// Decode an `_index` / `_vindex` select result.
pub fn decode_indexes(data: &[u8]) -> Result<Vec<IndexRecord>, DecodeError> {
    decode_rows(data, TupleKind::IndexRow)
}

fn decode_rows<T: DeserializeOwned>(data: &[u8], kind: TupleKind) -> Result<Vec<T>, DecodeError> {
    let mut cursor = TupleCursor::new(data);
    let count = cursor.read_batch_len()?;

    let mut rows = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_RECORDS));
    for _ in 0..count {
        let offset = cursor.offset();
        rows.push(cursor.read::<T>()?);
        trace!(?kind, offset, "decoded tuple");
    }
    cursor.finish()?;

    Ok(rows)
}

/// Read one mandatory positional element.
pub(crate) fn required<'de, A, T>(
    seq: &mut A,
    position: usize,
    expected: &dyn de::Expected,
) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(position, expected))
}

/// Skip the remaining elements of a sequence.
///
/// The MessagePack deserializer rejects arrays that are not read to the end.
pub(crate) fn skip_rest<'de, A: SeqAccess<'de>>(seq: &mut A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

/// Skip the value of a map entry whose key is not interesting.
pub(crate) fn skip_value<'de, A: MapAccess<'de>>(map: &mut A) -> Result<(), A::Error> {
    map.next_value::<IgnoredAny>().map(|_| ())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{Value, json};

    /// Helper: encode a JSON value as MessagePack, the way a server would send it.
    pub(crate) fn msgpack(value: &Value) -> Vec<u8> {
        rmp_serde::to_vec(value).unwrap()
    }

    /// Helper: a minimal `_space` tuple whose name is the raw `str` payload `name`.
    pub(crate) fn space_tuple_with_raw_name(id: u32, name: &[u8]) -> Vec<u8> {
        let mut tuple = vec![0x95];
        rmp::encode::write_uint(&mut tuple, id.into()).unwrap();
        rmp::encode::write_uint(&mut tuple, 1).unwrap();
        rmp::encode::write_str_len(&mut tuple, name.len() as u32).unwrap();
        tuple.extend_from_slice(name);
        rmp::encode::write_str(&mut tuple, "memtx").unwrap();
        rmp::encode::write_uint(&mut tuple, 0).unwrap();
        tuple
    }

    #[test]
    fn test_decode_empty_batch() {
        let data = msgpack(&json!([]));
        assert!(decode_spaces(&data).unwrap().is_empty());
        assert!(decode_indexes(&data).unwrap().is_empty());
    }

    #[test]
    fn test_cursor_tracks_offset() {
        let tuple = msgpack(&json!([512, 1, "users", "memtx", 0]));
        let mut data = vec![0x92];
        data.extend_from_slice(&tuple);
        data.extend_from_slice(&tuple);

        let mut cursor = TupleCursor::new(&data);
        assert_eq!(cursor.read_batch_len().unwrap(), 2);
        assert_eq!(cursor.offset(), 1);
        let first: SpaceRecord = cursor.read().unwrap();
        assert_eq!(first.id, 512);
        assert_eq!(cursor.offset(), 1 + tuple.len());
        cursor.read::<SpaceRecord>().unwrap();
        cursor.finish().unwrap();
    }

    #[test]
    fn test_batch_header_not_an_array() {
        let data = msgpack(&json!({"a": 1}));
        let err = decode_spaces(&data).unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.reason.contains("batch header"), "got: {}", err.reason);
    }

    #[test]
    fn test_empty_buffer() {
        let err = decode_spaces(&[]).unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut data = msgpack(&json!([]));
        data.push(0xc0);
        let err = decode_spaces(&data).unwrap_err();
        assert_eq!(err.offset, 1);
        assert!(err.reason.contains("trailing"), "got: {}", err.reason);
    }

    #[test]
    fn test_truncated_tuple() {
        let data = msgpack(&json!([[512, 1, "users", "memtx", 0]]));
        let truncated = &data[..data.len() - 3];
        let err = decode_spaces(truncated).unwrap_err();
        assert!(err.offset <= truncated.len());
        assert!(err.offset > 1, "offset should point inside the tuple: {}", err.offset);
    }

    #[test]
    fn test_batch_declares_more_tuples_than_present() {
        let tuple = msgpack(&json!([512, 1, "users", "memtx", 0]));
        let mut data = vec![0x93];
        data.extend_from_slice(&tuple);
        let err = decode_spaces(&data).unwrap_err();
        assert_eq!(err.offset, data.len());
    }

    #[test]
    fn test_oversized_array_header() {
        // Batch of one tuple whose array32 header claims u32::MAX elements.
        let data = [0x91, 0xdd, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(decode_spaces(&data).is_err());
        assert!(decode_indexes(&data).is_err());
    }

    #[test]
    fn test_huge_batch_count_does_not_preallocate() {
        let data = [0xdd, 0xff, 0xff, 0xff, 0xff];
        let err = decode_spaces(&data).unwrap_err();
        assert_eq!(err.offset, data.len());
    }
}
