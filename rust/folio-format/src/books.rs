//! `books.bin` (the text container) and `books.idx` (one entry per book).
//!
//! The container is a header, a run of text blocks, and a block index table at
//! `index_offset`. Page text is addressed through the pages index: block id plus
//! offset inside that block. Blocks are written back to back, so a page may run past
//! the end of its first block into the next one.

use std::{borrow::Cow, ops::Range};

use folio_common::{Result, error::Error};

use crate::{
    Header, Record, RecordTable, le, pages::PageIndexEntry,
    record::index_header,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooksHeader {
    pub version: u32,
    /// Block compression scheme; 0 means stored.
    pub compression: u32,
    pub block_size: u32,
    pub block_count: u64,
    /// Absolute offset of the block index table.
    pub index_offset: u64,
}

impl Record for BooksHeader {
    const SIZE: usize = 36;

    fn decode(buf: &[u8], offset: usize) -> Self {
        BooksHeader {
            version: le::u32_at(buf, offset + 4),
            compression: le::u32_at(buf, offset + 8),
            block_size: le::u32_at(buf, offset + 12),
            block_count: le::u64_at(buf, offset + 20),
            index_offset: le::u64_at(buf, offset + 28),
        }
    }
}

impl Header for BooksHeader {
    const MAGIC: [u8; 4] = *b"BKSB";
    const ELEMENT: &'static str = "books header";
}

impl BooksHeader {
    /// Fails with an unsupported feature error unless blocks are stored uncompressed.
    pub fn ensure_stored(&self) -> Result<()> {
        if self.compression != 0 {
            return Err(Error::unsupported(
                Self::ELEMENT,
                format!("compressed text blocks (scheme {})", self.compression),
            ));
        }
        Ok(())
    }

    /// Absolute offset of block index entry `block_id`.
    pub fn block_entry_offset(&self, block_id: u32) -> u64 {
        self.index_offset
            .saturating_add(block_id as u64 * BlockIndexEntry::SIZE as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub uncompressed_offset: u64,
    pub uncompressed_size: u32,
    pub compressed_offset: u64,
    pub compressed_size: u32,
}

impl Record for BlockIndexEntry {
    const SIZE: usize = 24;

    fn decode(buf: &[u8], offset: usize) -> Self {
        BlockIndexEntry {
            uncompressed_offset: le::u64_at(buf, offset),
            uncompressed_size: le::u32_at(buf, offset + 8),
            compressed_offset: le::u64_at(buf, offset + 12),
            compressed_size: le::u32_at(buf, offset + 20),
        }
    }
}

/// Byte range of a page's text inside `books.bin`.
///
/// # Errors
///
/// Format error if the range overflows, or if it starts in the text region ahead
/// of the block index table and runs into that table.
pub fn page_text_range(
    header: &BooksHeader,
    block: &BlockIndexEntry,
    page: &PageIndexEntry,
) -> Result<Range<u64>> {
    let range = block
        .compressed_offset
        .checked_add(page.offset_in_block as u64)
        .and_then(|start| Some(start..start.checked_add(page.length as u64)?))
        .ok_or_else(|| {
            Error::invalid_format(
                "books text",
                format!(
                    "page {} text offset {} + {} + {} overflows",
                    page.page_id, block.compressed_offset, page.offset_in_block, page.length
                ),
            )
        })?;
    if range.start < header.index_offset && range.end > header.index_offset {
        return Err(Error::invalid_format(
            "books text",
            format!(
                "page {} text {}..{} runs into the block index at {}",
                page.page_id, range.start, range.end, header.index_offset
            ),
        ));
    }
    Ok(range)
}

/// Read-only view over a whole `books.bin` buffer.
#[derive(Clone, Copy)]
pub struct BooksFile<'a> {
    buf: &'a [u8],
    header: BooksHeader,
    blocks: RecordTable<'a, BlockIndexEntry>,
}

impl<'a> BooksFile<'a> {
    pub fn open(buf: &'a [u8]) -> Result<BooksFile<'a>> {
        let header = BooksHeader::parse(buf)?;
        let blocks = RecordTable::new(
            buf,
            header.index_offset,
            header.block_count,
            "books block index",
        )?;
        Ok(BooksFile {
            buf,
            header,
            blocks,
        })
    }

    pub fn header(&self) -> &BooksHeader {
        &self.header
    }

    pub fn blocks(&self) -> RecordTable<'a, BlockIndexEntry> {
        self.blocks
    }

    /// Returns the text of `page`.
    ///
    /// # Errors
    ///
    /// - unsupported feature if the container blocks are compressed;
    /// - format error if the page refers to a missing block or its text lies
    ///   outside the container.
    pub fn page_text(&self, page: &PageIndexEntry) -> Result<Cow<'a, str>> {
        self.header.ensure_stored()?;
        let block = self.blocks.try_get(page.block_id as usize).ok_or_else(|| {
            Error::invalid_format(
                "books block index",
                format!(
                    "page {} refers to block {} of {}",
                    page.page_id,
                    page.block_id,
                    self.blocks.len()
                ),
            )
        })?;
        let range = page_text_range(&self.header, &block, page)?;
        if range.end > self.buf.len() as u64 {
            return Err(Error::invalid_format(
                "books text",
                format!(
                    "page {} text {}..{} beyond {} bytes",
                    page.page_id,
                    range.start,
                    range.end,
                    self.buf.len()
                ),
            ));
        }
        Ok(le::str_at(
            self.buf,
            range.start as usize,
            page.length as usize,
        ))
    }
}

index_header!(
    /// Header of `books.idx` (magic `BKIX`).
    BooksIndexHeader,
    b"BKIX",
    "books index header"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookIndexEntry {
    pub book_id: u32,
    pub first_chapter_id: u32,
    pub chapter_count: u32,
    pub first_page_id: u32,
    pub page_count: u32,
    /// Index into `titles.bin`.
    pub title_index: u32,
    pub text_start_offset: u64,
    pub text_end_offset: u64,
}

impl Record for BookIndexEntry {
    const SIZE: usize = 40;

    fn decode(buf: &[u8], offset: usize) -> Self {
        BookIndexEntry {
            book_id: le::u32_at(buf, offset),
            first_chapter_id: le::u32_at(buf, offset + 4),
            chapter_count: le::u32_at(buf, offset + 8),
            first_page_id: le::u32_at(buf, offset + 12),
            page_count: le::u32_at(buf, offset + 16),
            title_index: le::u32_at(buf, offset + 20),
            text_start_offset: le::u64_at(buf, offset + 24),
            text_end_offset: le::u64_at(buf, offset + 32),
        }
    }
}

impl BookIndexEntry {
    /// Page ids of the book; pages of a book are contiguous.
    pub fn page_ids(&self) -> Range<u32> {
        self.first_page_id..self.first_page_id + self.page_count
    }

    /// Chapter ids of the book; chapters of a book are contiguous.
    pub fn chapter_ids(&self) -> Range<u32> {
        self.first_chapter_id..self.first_chapter_id + self.chapter_count
    }
}

/// Read-only view over a whole `books.idx` buffer.
#[derive(Clone, Copy)]
pub struct BooksIndex<'a> {
    header: BooksIndexHeader,
    entries: RecordTable<'a, BookIndexEntry>,
}

impl<'a> BooksIndex<'a> {
    pub fn open(buf: &'a [u8]) -> Result<BooksIndex<'a>> {
        let header = BooksIndexHeader::parse(buf)?;
        let entries = RecordTable::new(
            buf,
            BooksIndexHeader::SIZE as u64,
            header.count as u64,
            BooksIndexHeader::ELEMENT,
        )?;
        Ok(BooksIndex { header, entries })
    }

    pub fn header(&self) -> &BooksIndexHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, BookIndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds a book by id.
    pub fn find(&self, book_id: u32) -> Option<BookIndexEntry> {
        self.entries.iter().find(|b| b.book_id == book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64(buf: &mut Vec<u8>, v: u64) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    /// A container with two 8-byte blocks holding "alpha beta gamma".
    fn books_bytes(compression: u32) -> Vec<u8> {
        let text = b"alpha beta gamma";
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BKSB");
        put_u32(&mut buf, 1);
        put_u32(&mut buf, compression);
        put_u32(&mut buf, 8);
        put_u32(&mut buf, 0);
        put_u64(&mut buf, 2);
        let index_offset = 36 + text.len() as u64;
        put_u64(&mut buf, index_offset);
        buf.extend_from_slice(text);
        for block in 0..2u64 {
            put_u64(&mut buf, block * 8);
            put_u32(&mut buf, 8);
            put_u64(&mut buf, 36 + block * 8);
            put_u32(&mut buf, 8);
        }
        buf
    }

    fn page(block_id: u32, offset_in_block: u32, length: u32) -> PageIndexEntry {
        PageIndexEntry {
            page_id: 1,
            book_id: 0,
            chapter_id: 0,
            page_number: 1,
            block_id,
            offset_in_block,
            length,
        }
    }

    #[test]
    fn test_books_header() {
        let buf = books_bytes(0);
        let header = BooksHeader::parse(&buf).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.block_size, 8);
        assert_eq!(header.block_count, 2);
        assert_eq!(header.index_offset, 52);
        assert_eq!(header.block_entry_offset(1), 76);
    }

    #[test]
    fn test_page_text() {
        let buf = books_bytes(0);
        let books = BooksFile::open(&buf).unwrap();
        assert_eq!(books.blocks().len(), 2);
        assert_eq!(
            books.blocks().get(1),
            BlockIndexEntry {
                uncompressed_offset: 8,
                uncompressed_size: 8,
                compressed_offset: 44,
                compressed_size: 8,
            }
        );
        assert_eq!(books.page_text(&page(0, 0, 5)).unwrap(), "alpha");
        // Spans the boundary between the two blocks.
        assert_eq!(books.page_text(&page(0, 6, 4)).unwrap(), "beta");
        assert_eq!(books.page_text(&page(1, 3, 5)).unwrap(), "gamma");
        assert_eq!(books.page_text(&page(1, 0, 0)).unwrap(), "");

        assert!(books.page_text(&page(2, 0, 1)).unwrap_err().is_format());
        assert!(books.page_text(&page(1, 7, 20)).unwrap_err().is_format());
        // Ends exactly where the block index starts.
        assert_eq!(books.page_text(&page(1, 3, 5)).unwrap().len(), 5);
        assert!(books.page_text(&page(1, 3, 6)).unwrap_err().is_format());
    }

    #[test]
    fn test_page_text_range_bounds() {
        let header = BooksHeader::parse(&books_bytes(0)).unwrap();
        let block = BlockIndexEntry {
            uncompressed_offset: 0,
            uncompressed_size: 8,
            compressed_offset: 36,
            compressed_size: 8,
        };
        assert_eq!(
            page_text_range(&header, &block, &page(0, 2, 3)).unwrap(),
            38..41
        );
        assert!(
            page_text_range(&header, &block, &page(0, 10, 7))
                .unwrap_err()
                .is_format()
        );

        let overflowing = BlockIndexEntry {
            compressed_offset: u64::MAX - 1,
            ..block
        };
        assert!(
            page_text_range(&header, &overflowing, &page(0, 10, 1))
                .unwrap_err()
                .is_format()
        );
        let at_limit = BlockIndexEntry {
            compressed_offset: u64::MAX - 4,
            ..block
        };
        assert!(
            page_text_range(&header, &at_limit, &page(0, 0, 5))
                .unwrap_err()
                .is_format()
        );
        // Text stored after the block index is not bounded by it.
        let trailing = BlockIndexEntry {
            compressed_offset: 200,
            ..block
        };
        assert_eq!(
            page_text_range(&header, &trailing, &page(0, 0, 4)).unwrap(),
            200..204
        );
    }

    #[test]
    fn test_compressed_books_rejected() {
        let buf = books_bytes(1);
        let books = BooksFile::open(&buf).unwrap();
        assert!(books.page_text(&page(0, 0, 5)).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_books_index() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BKIX");
        put_u32(&mut buf, 1);
        put_u32(&mut buf, 2);
        buf.extend_from_slice(&[0u8; 12]);
        for (id, first_page) in [(10u32, 0u32), (11, 40)] {
            for f in [id, id * 3, 4, first_page, 40, id - 10] {
                put_u32(&mut buf, f);
            }
            put_u64(&mut buf, first_page as u64 * 1000);
            put_u64(&mut buf, (first_page as u64 + 40) * 1000);
        }

        let index = BooksIndex::open(&buf).unwrap();
        assert_eq!(index.len(), 2);
        let book = index.find(11).unwrap();
        assert_eq!(book.first_chapter_id, 33);
        assert_eq!(book.title_index, 1);
        assert_eq!(book.page_ids(), 40..80);
        assert_eq!(book.chapter_ids(), 33..37);
        assert_eq!(book.text_end_offset, 80_000);
        assert!(index.find(12).is_none());
    }
}
