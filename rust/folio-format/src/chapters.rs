//! `chapters.idx`: one fixed-size entry per chapter.

use std::ops::Range;

use folio_common::Result;

use crate::{Header, Record, RecordTable, le, record::index_header};

index_header!(
    /// Header of `chapters.idx` (magic `CHIX`).
    ChaptersIndexHeader,
    b"CHIX",
    "chapters index header"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterIndexEntry {
    pub chapter_id: u32,
    pub book_id: u32,
    pub chapter_number: u32,
    pub first_page_id: u32,
    pub page_count: u32,
    /// Index into `titles.bin`.
    pub title_index: u32,
}

impl Record for ChapterIndexEntry {
    const SIZE: usize = 32;

    fn decode(buf: &[u8], offset: usize) -> Self {
        ChapterIndexEntry {
            chapter_id: le::u32_at(buf, offset),
            book_id: le::u32_at(buf, offset + 4),
            chapter_number: le::u32_at(buf, offset + 8),
            first_page_id: le::u32_at(buf, offset + 12),
            page_count: le::u32_at(buf, offset + 16),
            title_index: le::u32_at(buf, offset + 20),
        }
    }
}

impl ChapterIndexEntry {
    pub fn page_ids(&self) -> Range<u32> {
        self.first_page_id..self.first_page_id + self.page_count
    }
}

/// Read-only view over a whole `chapters.idx` buffer.
#[derive(Clone, Copy)]
pub struct ChaptersIndex<'a> {
    header: ChaptersIndexHeader,
    entries: RecordTable<'a, ChapterIndexEntry>,
}

impl<'a> ChaptersIndex<'a> {
    pub fn open(buf: &'a [u8]) -> Result<ChaptersIndex<'a>> {
        let header = ChaptersIndexHeader::parse(buf)?;
        let entries = RecordTable::new(
            buf,
            ChaptersIndexHeader::SIZE as u64,
            header.count as u64,
            ChaptersIndexHeader::ELEMENT,
        )?;
        Ok(ChaptersIndex { header, entries })
    }

    pub fn header(&self) -> &ChaptersIndexHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, ChapterIndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chapters of `book_id`, in table order.
    pub fn of_book(&self, book_id: u32) -> impl Iterator<Item = ChapterIndexEntry> + use<'a> {
        self.entries.iter().filter(move |c| c.book_id == book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapters_index() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"CHIX");
        for v in [1u32, 3, 0, 0, 0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for (id, book) in [(0u32, 0u32), (1, 0), (2, 1)] {
            for v in [id, book, id + 1, id * 10, 10, 5 + id, 0xffff_ffff, 0xffff_ffff] {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }

        let chapters = ChaptersIndex::open(&buf).unwrap();
        assert_eq!(chapters.len(), 3);
        assert_eq!(
            chapters.entries().get(2),
            ChapterIndexEntry {
                chapter_id: 2,
                book_id: 1,
                chapter_number: 3,
                first_page_id: 20,
                page_count: 10,
                title_index: 7,
            }
        );
        assert_eq!(chapters.entries().get(1).page_ids(), 10..20);
        let ids: Vec<u32> = chapters.of_book(0).map(|c| c.chapter_id).collect();
        assert_eq!(ids, [0, 1]);
    }

    #[test]
    fn test_table_exceeding_buffer() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"CHIX");
        for v in [1u32, 2, 0, 0, 0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&[0u8; 32]);
        let err = ChaptersIndex::open(&buf).err().unwrap();
        assert!(err.is_format());
    }
}
