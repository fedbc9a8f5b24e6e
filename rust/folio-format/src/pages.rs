//! `pages.idx`: one fixed-size entry per page, locating the page text inside the
//! books container.

use folio_common::Result;

use crate::{
    Header, Record, RecordTable, le,
    record::index_header,
};

index_header!(
    /// Header of `pages.idx` (magic `PGIX`).
    PagesIndexHeader,
    b"PGIX",
    "pages index header"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIndexEntry {
    pub page_id: u32,
    pub book_id: u32,
    pub chapter_id: u32,
    pub page_number: u32,
    /// Books container block holding the first byte of the page text.
    pub block_id: u32,
    pub offset_in_block: u32,
    /// Page text length in bytes.
    pub length: u32,
}

impl Record for PageIndexEntry {
    const SIZE: usize = 32;

    fn decode(buf: &[u8], offset: usize) -> Self {
        PageIndexEntry {
            page_id: le::u32_at(buf, offset),
            book_id: le::u32_at(buf, offset + 4),
            chapter_id: le::u32_at(buf, offset + 8),
            page_number: le::u32_at(buf, offset + 12),
            block_id: le::u32_at(buf, offset + 16),
            offset_in_block: le::u32_at(buf, offset + 24),
            length: le::u32_at(buf, offset + 28),
        }
    }
}

/// Read-only view over a whole `pages.idx` buffer.
#[derive(Clone, Copy)]
pub struct PagesIndex<'a> {
    header: PagesIndexHeader,
    entries: RecordTable<'a, PageIndexEntry>,
    /// Page ids are strictly ascending, enabling binary search.
    sorted: bool,
}

impl<'a> PagesIndex<'a> {
    pub fn open(buf: &'a [u8]) -> Result<PagesIndex<'a>> {
        let header = PagesIndexHeader::parse(buf)?;
        let entries = RecordTable::<PageIndexEntry>::new(
            buf,
            PagesIndexHeader::SIZE as u64,
            header.count as u64,
            PagesIndexHeader::ELEMENT,
        )?;
        let mut ids = entries.iter().map(|e| e.page_id);
        let sorted = match ids.next() {
            Some(first) => ids
                .try_fold(first, |prev, id| (id > prev).then_some(id))
                .is_some(),
            None => true,
        };
        Ok(PagesIndex {
            header,
            entries,
            sorted,
        })
    }

    pub fn header(&self) -> &PagesIndexHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, PageIndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether page ids are strictly ascending in table order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Finds the entry of `page_id`: binary search over a sorted table, linear scan
    /// otherwise. `None` for an unknown id.
    pub fn find(&self, page_id: u32) -> Option<PageIndexEntry> {
        if self.sorted {
            let pos = self.entries.partition_point(|e| e.page_id < page_id);
            self.entries
                .try_get(pos)
                .filter(|e| e.page_id == page_id)
        } else {
            self.entries.iter().find(|e| e.page_id == page_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_bytes(ids: &[u32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"PGIX");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(ids.len() as u32).to_le_bytes());
        buf.extend_from_slice(&[0u8; 12]);
        for &id in ids {
            let fields = [id, 7, 3, id + 100, 2, 0xdead, 512, 64];
            for f in fields {
                buf.extend_from_slice(&f.to_le_bytes());
            }
        }
        buf
    }

    #[test]
    fn test_decode_page_entry() {
        let buf = page_bytes(&[42]);
        let index = PagesIndex::open(&buf).unwrap();
        assert_eq!(index.header().count, 1);
        assert_eq!(
            index.entries().get(0),
            PageIndexEntry {
                page_id: 42,
                book_id: 7,
                chapter_id: 3,
                page_number: 142,
                block_id: 2,
                offset_in_block: 512,
                length: 64,
            }
        );
    }

    #[test]
    fn test_find_sorted_and_unsorted() {
        let buf = page_bytes(&[1, 2, 5, 9, 12]);
        let index = PagesIndex::open(&buf).unwrap();
        assert!(index.is_sorted());
        assert_eq!(index.find(9).unwrap().page_number, 109);
        assert_eq!(index.find(1).unwrap().page_number, 101);
        assert!(index.find(3).is_none());
        assert!(index.find(13).is_none());
        assert!(index.find(0).is_none());

        let buf = page_bytes(&[5, 1, 9, 2]);
        let index = PagesIndex::open(&buf).unwrap();
        assert!(!index.is_sorted());
        assert_eq!(index.find(2).unwrap().page_number, 102);
        assert!(index.find(3).is_none());

        let buf = page_bytes(&[]);
        let index = PagesIndex::open(&buf).unwrap();
        assert!(index.is_empty());
        assert!(index.find(0).is_none());
    }

    #[test]
    fn test_bad_header() {
        let mut buf = page_bytes(&[1]);
        buf[0] = b'X';
        assert!(PagesIndex::open(&buf).err().unwrap().is_format());

        let mut buf = page_bytes(&[1]);
        buf[4] = 2;
        assert!(PagesIndex::open(&buf).err().unwrap().is_format());

        let buf = page_bytes(&[1, 2]);
        assert!(PagesIndex::open(&buf[..buf.len() - 1]).err().unwrap().is_format());
        assert!(PagesIndex::open(&buf[..10]).err().unwrap().is_format());
    }
}
