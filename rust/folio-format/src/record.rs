use std::marker::PhantomData;

use folio_common::{Result, error::Error};

use crate::{FORMAT_VERSION, le};

/// A fixed-size packed record.
pub trait Record: Sized {
    /// Encoded size in bytes, which is also the table stride.
    const SIZE: usize;

    /// Decodes the record starting at `offset`.
    ///
    /// # Panics
    ///
    /// If `buf` holds fewer than `offset + SIZE` bytes.
    fn decode(buf: &[u8], offset: usize) -> Self;
}

/// A file header: a record that starts with a magic and a version.
pub trait Header: Record {
    const MAGIC: [u8; 4];

    /// Human readable name of the header, used in error messages.
    const ELEMENT: &'static str;

    /// Decodes the header at the start of `buf`, validating size, magic and version.
    ///
    /// # Errors
    ///
    /// A format error if `buf` is shorter than the header, if the magic does not
    /// match, or if the version is not [`FORMAT_VERSION`].
    fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::invalid_format(
                Self::ELEMENT,
                format!("truncated header: {} of {} bytes", buf.len(), Self::SIZE),
            ));
        }
        let magic = le::magic_at(buf, 0);
        if magic != Self::MAGIC {
            return Err(Error::invalid_format(
                Self::ELEMENT,
                format!(
                    "bad magic {:?}, expected {:?}",
                    String::from_utf8_lossy(&magic),
                    String::from_utf8_lossy(&Self::MAGIC)
                ),
            ));
        }
        let version = le::u32_at(buf, 4);
        if version != FORMAT_VERSION {
            return Err(Error::invalid_format(
                Self::ELEMENT,
                format!("unsupported version {version}"),
            ));
        }
        Ok(Self::decode(buf, 0))
    }
}

/// Decodes entry `index` of a fixed-stride table starting at `table_offset`.
#[inline]
pub fn entry<R: Record>(buf: &[u8], table_offset: usize, index: usize) -> R {
    R::decode(buf, table_offset + index * R::SIZE)
}

/// A fixed-stride table of `R` records inside a borrowed buffer.
pub struct RecordTable<'a, R> {
    buf: &'a [u8],
    offset: usize,
    len: usize,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordTable<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RecordTable<'_, R> {}

impl<'a, R: Record> RecordTable<'a, R> {
    /// Creates a table of `len` records at `offset`, checking that it fits in `buf`.
    pub fn new(buf: &'a [u8], offset: u64, len: u64, element: &str) -> Result<Self> {
        let end = len
            .checked_mul(R::SIZE as u64)
            .and_then(|size| size.checked_add(offset));
        match end {
            Some(end) if end <= buf.len() as u64 => Ok(RecordTable {
                buf,
                offset: offset as usize,
                len: len as usize,
                _marker: PhantomData,
            }),
            _ => Err(Error::invalid_format(
                element,
                format!(
                    "table of {len} x {} bytes at {offset} exceeds {} bytes",
                    R::SIZE,
                    buf.len()
                ),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset of the first record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decodes record `index`.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn get(&self, index: usize) -> R {
        assert!(index < self.len, "record index {index} >= {}", self.len);
        entry(self.buf, self.offset, index)
    }

    pub fn try_get(&self, index: usize) -> Option<R> {
        (index < self.len).then(|| entry(self.buf, self.offset, index))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = R> + use<'a, R> {
        let table = *self;
        (0..table.len).map(move |i| entry(table.buf, table.offset, i))
    }

    /// Index of the first record for which `pred` is false, assuming the table is
    /// partitioned (all `true` records precede all `false` ones).
    pub fn partition_point(&self, mut pred: impl FnMut(&R) -> bool) -> usize {
        let (mut lo, mut hi) = (0, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(&self.get(mid)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

/// Declares the 24-byte header shared by the books, pages and chapters indexes:
/// magic, version, record count, and two reserved fields.
macro_rules! index_header {
    ($(#[$meta:meta])* $name:ident, $magic:literal, $element:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub version: u32,
            pub count: u32,
        }

        impl $crate::record::Record for $name {
            const SIZE: usize = 24;

            fn decode(buf: &[u8], offset: usize) -> Self {
                $name {
                    version: $crate::le::u32_at(buf, offset + 4),
                    count: $crate::le::u32_at(buf, offset + 8),
                }
            }
        }

        impl $crate::record::Header for $name {
            const MAGIC: [u8; 4] = *$magic;
            const ELEMENT: &'static str = $element;
        }
    };
}

pub(crate) use index_header;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair(u32, u32);

    impl Record for Pair {
        const SIZE: usize = 8;

        fn decode(buf: &[u8], offset: usize) -> Self {
            Pair(le::u32_at(buf, offset), le::u32_at(buf, offset + 4))
        }
    }

    fn table_bytes() -> Vec<u8> {
        let mut buf = vec![0xAA; 3];
        for i in 0u32..4 {
            buf.extend_from_slice(&i.to_le_bytes());
            buf.extend_from_slice(&(i * 10).to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_entry_addressing() {
        let buf = table_bytes();
        assert_eq!(entry::<Pair>(&buf, 3, 0), Pair(0, 0));
        assert_eq!(entry::<Pair>(&buf, 3, 2), Pair(2, 20));
    }

    #[test]
    fn test_record_table() {
        let buf = table_bytes();
        let table = RecordTable::<Pair>::new(&buf, 3, 4, "pairs").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(3), Pair(3, 30));
        assert_eq!(table.try_get(4), None);
        assert_eq!(
            table.iter().map(|p| p.1).collect::<Vec<_>>(),
            vec![0, 10, 20, 30]
        );
        assert_eq!(table.partition_point(|p| p.0 < 2), 2);
        assert_eq!(table.partition_point(|p| p.0 < 100), 4);

        assert!(matches!(
            RecordTable::<Pair>::new(&buf, 3, 5, "pairs"),
            Err(e) if e.is_format()
        ));
        assert!(RecordTable::<Pair>::new(&buf, u64::MAX, 1, "pairs").is_err());
        assert!(RecordTable::<Pair>::new(&buf, 0, u64::MAX, "pairs").is_err());
        assert!(RecordTable::<Pair>::new(&buf, 35, 0, "pairs").is_ok());
    }
}
