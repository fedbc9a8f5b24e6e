//! Serializers for the corpus file kinds.
//!
//! Each function lays out one complete file in the packed little-endian format
//! read by `folio-format`. Inputs are trusted: callers are responsible for sorting
//! tables where the reader expects sorted data.

use std::collections::BTreeMap;

use byteorder::{LittleEndian, WriteBytesExt};
use folio_format::{FORMAT_VERSION, hash::hash64};

/// Bit 0 of the postings header flags.
pub const POSTINGS_COMPRESSED: u32 = 1;

type Le = LittleEndian;

fn header(buf: &mut Vec<u8>, magic: &[u8; 4]) {
    buf.extend_from_slice(magic);
    buf.write_u32::<Le>(FORMAT_VERSION).expect("vec write");
}

/// Pads `buf` with zeros up to `len` bytes.
fn pad_to(buf: &mut Vec<u8>, len: usize) {
    assert!(buf.len() <= len, "{} > {len}", buf.len());
    buf.resize(len, 0);
}

/// A `books.bin` holding `text` split into blocks of `block_size` bytes, stored
/// after the header and followed by the block index.
pub fn books_bin(text: &[u8], block_size: usize, compression: u32) -> Vec<u8> {
    assert!(block_size > 0);
    let blocks: Vec<&[u8]> = text.chunks(block_size).collect();
    let index_offset = 36 + text.len() as u64;

    let mut buf = Vec::with_capacity(index_offset as usize + blocks.len() * 24);
    header(&mut buf, b"BKSB");
    buf.write_u32::<Le>(compression).expect("vec write");
    buf.write_u32::<Le>(block_size as u32).expect("vec write");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(blocks.len() as u64).expect("vec write");
    buf.write_u64::<Le>(index_offset).expect("vec write");
    buf.extend_from_slice(text);

    let mut offset = 0u64;
    for block in blocks {
        buf.write_u64::<Le>(offset).expect("vec write");
        buf.write_u32::<Le>(block.len() as u32).expect("vec write");
        buf.write_u64::<Le>(36 + offset).expect("vec write");
        buf.write_u32::<Le>(block.len() as u32).expect("vec write");
        offset += block.len() as u64;
    }
    buf
}

/// One row of `books.idx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookRow {
    pub book_id: u32,
    pub first_chapter_id: u32,
    pub chapter_count: u32,
    pub first_page_id: u32,
    pub page_count: u32,
    pub title_index: u32,
    pub text_start_offset: u64,
    pub text_end_offset: u64,
}

/// One row of `pages.idx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRow {
    pub page_id: u32,
    pub book_id: u32,
    pub chapter_id: u32,
    pub page_number: u32,
    pub block_id: u32,
    pub offset_in_block: u32,
    pub length: u32,
}

/// One row of `chapters.idx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterRow {
    pub chapter_id: u32,
    pub book_id: u32,
    pub chapter_number: u32,
    pub first_page_id: u32,
    pub page_count: u32,
    pub title_index: u32,
}

fn index_file(magic: &[u8; 4], count: usize, stride: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(24 + count * stride);
    header(&mut buf, magic);
    buf.write_u32::<Le>(count as u32).expect("vec write");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(0).expect("vec write");
    buf
}

pub fn books_idx(rows: &[BookRow]) -> Vec<u8> {
    let mut buf = index_file(b"BKIX", rows.len(), 40);
    for row in rows {
        for v in [
            row.book_id,
            row.first_chapter_id,
            row.chapter_count,
            row.first_page_id,
            row.page_count,
            row.title_index,
        ] {
            buf.write_u32::<Le>(v).expect("vec write");
        }
        buf.write_u64::<Le>(row.text_start_offset).expect("vec write");
        buf.write_u64::<Le>(row.text_end_offset).expect("vec write");
    }
    buf
}

pub fn pages_idx(rows: &[PageRow]) -> Vec<u8> {
    let mut buf = index_file(b"PGIX", rows.len(), 32);
    for row in rows {
        for v in [
            row.page_id,
            row.book_id,
            row.chapter_id,
            row.page_number,
            row.block_id,
            0,
            row.offset_in_block,
            row.length,
        ] {
            buf.write_u32::<Le>(v).expect("vec write");
        }
    }
    buf
}

pub fn chapters_idx(rows: &[ChapterRow]) -> Vec<u8> {
    let mut buf = index_file(b"CHIX", rows.len(), 32);
    for row in rows {
        for v in [
            row.chapter_id,
            row.book_id,
            row.chapter_number,
            row.first_page_id,
            row.page_count,
            row.title_index,
            0,
            0,
        ] {
            buf.write_u32::<Le>(v).expect("vec write");
        }
    }
    buf
}

/// A `titles.bin` with the title table right after the header and the strings
/// blob after the table.
pub fn titles_bin(titles: &[&str]) -> Vec<u8> {
    let strings_offset = 24 + 16 * titles.len() as u64;
    let mut buf = Vec::new();
    header(&mut buf, b"TTLB");
    buf.write_u32::<Le>(titles.len() as u32).expect("vec write");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(strings_offset).expect("vec write");

    let mut offset = 0u64;
    for title in titles {
        buf.write_u64::<Le>(offset).expect("vec write");
        buf.write_u32::<Le>(title.len() as u32).expect("vec write");
        buf.write_u32::<Le>(0).expect("vec write");
        offset += title.len() as u64;
    }
    for title in titles {
        buf.extend_from_slice(title.as_bytes());
    }
    buf
}

/// A word dictionary from `(word_hash, postings_offset, postings_count)` triples,
/// sorted here by hash.
pub fn word_dict(entries: &[(u64, u64, u64)]) -> Vec<u8> {
    let mut entries = entries.to_vec();
    entries.sort_by_key(|e| e.0);

    let mut buf = Vec::with_capacity(20 + entries.len() * 24);
    header(&mut buf, b"WDIX");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(entries.len() as u64).expect("vec write");
    for (hash, offset, count) in entries {
        buf.write_u64::<Le>(hash).expect("vec write");
        buf.write_u64::<Le>(offset).expect("vec write");
        buf.write_u64::<Le>(count).expect("vec write");
    }
    buf
}

/// One row of the words index metadata file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordRow {
    pub word_id: u32,
    pub df: u32,
    pub cf: u32,
    pub postings_count: u32,
}

pub fn words_index(rows: &[WordRow], postings_file_size: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(36 + rows.len() * 40);
    header(&mut buf, b"WDIX");
    buf.write_u32::<Le>(rows.len() as u32).expect("vec write");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u32::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(0).expect("vec write");
    buf.write_u64::<Le>(postings_file_size).expect("vec write");
    for row in rows {
        for v in [row.word_id, row.df, row.cf, row.postings_count, 0, 0, 0, 0, 0, 0] {
            buf.write_u32::<Le>(v).expect("vec write");
        }
    }
    buf
}

/// Appends posting lists to a `postings.bin` image.
pub struct PostingsWriter {
    buf: Vec<u8>,
    flags: u32,
    lists: u64,
}

impl PostingsWriter {
    pub fn new() -> PostingsWriter {
        let mut buf = vec![0u8; 52];
        buf[..4].copy_from_slice(b"PSTB");
        PostingsWriter {
            buf,
            flags: 0,
            lists: 0,
        }
    }

    pub fn compressed(mut self, compressed: bool) -> Self {
        self.flags = if compressed { POSTINGS_COMPRESSED } else { 0 };
        self
    }

    /// Appends the list of `(page_id, positions)` pairs, which must be sorted by
    /// page id with ascending positions, and returns its absolute offset.
    pub fn add_list(&mut self, postings: &[(u32, &[u32])]) -> u64 {
        let offset = self.buf.len() as u64;
        let mut body = Vec::new();
        body.write_u32::<Le>(postings.len() as u32).expect("vec write");
        let mut prev_page = 0u32;
        for &(page_id, positions) in postings {
            body.write_u32::<Le>(page_id - prev_page).expect("vec write");
            body.write_u32::<Le>(positions.len() as u32).expect("vec write");
            let mut prev_pos = 0u32;
            for &pos in positions {
                body.write_u32::<Le>(pos - prev_pos).expect("vec write");
                prev_pos = pos;
            }
            prev_page = page_id;
        }
        self.buf.write_u32::<Le>(body.len() as u32).expect("vec write");
        self.buf.extend_from_slice(&body);
        self.lists += 1;
        offset
    }

    /// Appends raw bytes, for malformed-list tests; returns their offset.
    pub fn add_raw(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.buf.len() as u64;
        self.buf.extend_from_slice(bytes);
        offset
    }

    pub fn finish(mut self) -> Vec<u8> {
        let mut head = Vec::with_capacity(52);
        header(&mut head, b"PSTB");
        head.write_u32::<Le>(self.flags).expect("vec write");
        head.write_u32::<Le>(0).expect("vec write");
        head.write_u32::<Le>(0).expect("vec write");
        head.write_u64::<Le>(self.lists).expect("vec write");
        head.write_u64::<Le>(0).expect("vec write");
        head.write_u64::<Le>(0).expect("vec write");
        head.write_u64::<Le>(52).expect("vec write");
        pad_to(&mut head, 52);
        self.buf[..52].copy_from_slice(&head);
        self.buf
    }
}

impl Default for PostingsWriter {
    fn default() -> Self {
        PostingsWriter::new()
    }
}

/// Positional term index of a set of pages, tokenized on whitespace.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    terms: BTreeMap<String, BTreeMap<u32, Vec<u32>>>,
}

impl TermIndex {
    pub fn new() -> TermIndex {
        Default::default()
    }

    pub fn add_page(&mut self, page_id: u32, text: &str) {
        for (pos, term) in text.split_whitespace().enumerate() {
            self.add(term, page_id, pos as u32);
        }
    }

    pub fn add(&mut self, term: &str, page_id: u32, position: u32) {
        let positions = self
            .terms
            .entry(term.to_string())
            .or_default()
            .entry(page_id)
            .or_default();
        positions.push(position);
        positions.sort_unstable();
        positions.dedup();
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Writes `(word dictionary, postings)` images.
    pub fn build(&self, compressed: bool) -> (Vec<u8>, Vec<u8>) {
        let mut postings = PostingsWriter::new().compressed(compressed);
        let mut entries = Vec::with_capacity(self.terms.len());
        for (term, pages) in &self.terms {
            let list: Vec<(u32, &[u32])> = pages
                .iter()
                .map(|(&page, positions)| (page, positions.as_slice()))
                .collect();
            let offset = postings.add_list(&list);
            entries.push((hash64(term), offset, list.len() as u64));
        }
        (word_dict(&entries), postings.finish())
    }
}

/// A comment anchored on a page.
#[derive(Debug, Clone, Default)]
pub struct CommentRow {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub kind: u16,
    pub author_id: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingRow {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub flags: u16,
    pub style_id: u16,
    pub layer: u16,
    pub priority: u16,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightRow {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub deleted: bool,
    pub color_id: u16,
    pub category_id: u16,
}

/// An annotations file; tables are sorted here by page id (stable), absent tables
/// get a zero offset, and comment texts follow the tables.
pub fn annotations_bin(
    comments: &[CommentRow],
    formatting: &[FormattingRow],
    highlights: &[HighlightRow],
) -> Vec<u8> {
    let mut comments = comments.to_vec();
    comments.sort_by_key(|c| c.page_id);
    let mut formatting = formatting.to_vec();
    formatting.sort_by_key(|f| f.page_id);
    let mut highlights = highlights.to_vec();
    highlights.sort_by_key(|h| h.page_id);

    let table_offset = |base: u64, count: usize| if count == 0 { 0 } else { base };
    let comments_offset = 96u64;
    let formatting_offset = comments_offset + 52 * comments.len() as u64;
    let highlights_offset = formatting_offset + 24 * formatting.len() as u64;
    let texts_offset = highlights_offset + 48 * highlights.len() as u64;

    let mut buf = Vec::new();
    header(&mut buf, b"ANNO");
    buf.write_u64::<Le>(1).expect("vec write");
    buf.write_u64::<Le>(comments.len() as u64).expect("vec write");
    buf.write_u64::<Le>(formatting.len() as u64).expect("vec write");
    buf.write_u64::<Le>(highlights.len() as u64).expect("vec write");
    buf.write_u64::<Le>(table_offset(comments_offset, comments.len()))
        .expect("vec write");
    buf.write_u64::<Le>(table_offset(formatting_offset, formatting.len()))
        .expect("vec write");
    buf.write_u64::<Le>(table_offset(highlights_offset, highlights.len()))
        .expect("vec write");
    pad_to(&mut buf, 96);

    let mut text_offset = texts_offset;
    for c in &comments {
        buf.write_u32::<Le>(c.page_id).expect("vec write");
        buf.write_u32::<Le>(c.anchor_start).expect("vec write");
        buf.write_u32::<Le>(c.anchor_end).expect("vec write");
        buf.write_u16::<Le>(0).expect("vec write");
        buf.write_u16::<Le>(c.kind).expect("vec write");
        buf.write_u32::<Le>(c.author_id).expect("vec write");
        buf.write_u64::<Le>(0).expect("vec write");
        buf.write_u64::<Le>(0).expect("vec write");
        buf.write_u64::<Le>(text_offset).expect("vec write");
        buf.write_u32::<Le>(c.text.len() as u32).expect("vec write");
        buf.write_u32::<Le>(0).expect("vec write");
        text_offset += c.text.len() as u64;
    }
    for f in &formatting {
        buf.write_u32::<Le>(f.page_id).expect("vec write");
        buf.write_u32::<Le>(f.anchor_start).expect("vec write");
        buf.write_u32::<Le>(f.anchor_end).expect("vec write");
        buf.write_u16::<Le>(f.flags).expect("vec write");
        buf.write_u16::<Le>(f.style_id).expect("vec write");
        buf.write_u16::<Le>(f.layer).expect("vec write");
        buf.write_u16::<Le>(f.priority).expect("vec write");
        buf.write_u32::<Le>(0).expect("vec write");
    }
    for h in &highlights {
        buf.write_u32::<Le>(h.page_id).expect("vec write");
        buf.write_u32::<Le>(h.anchor_start).expect("vec write");
        buf.write_u32::<Le>(h.anchor_end).expect("vec write");
        buf.write_u16::<Le>(h.deleted as u16).expect("vec write");
        buf.write_u16::<Le>(h.color_id).expect("vec write");
        buf.write_u16::<Le>(h.category_id).expect("vec write");
        buf.write_u16::<Le>(0).expect("vec write");
        buf.write_u32::<Le>(0).expect("vec write");
        buf.write_u64::<Le>(0).expect("vec write");
        buf.write_u64::<Le>(0).expect("vec write");
        buf.write_u64::<Le>(0).expect("vec write");
    }
    for c in &comments {
        buf.extend_from_slice(c.text.as_bytes());
    }
    buf
}
