//! `annotations.bin`: page-anchored comments, formatting spans and highlights.
//!
//! Each of the three arrays is sorted ascending by `page_id`; per-page lookup is a
//! lower-bound binary search followed by a forward scan. Anchors are half-open token
//! ranges `[anchor_start, anchor_end)`.

use std::{borrow::Cow, ops::Range};

use bitflags::bitflags;
use folio_common::{Result, error::Error};

use crate::{Header, Record, RecordTable, le};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnoHeader {
    pub version: u32,
    pub corpus_version: u64,
    pub comments_count: u64,
    pub formatting_count: u64,
    pub highlights_count: u64,
    pub comments_offset: u64,
    pub formatting_offset: u64,
    pub highlights_offset: u64,
}

impl Record for AnnoHeader {
    const SIZE: usize = 96;

    fn decode(buf: &[u8], offset: usize) -> Self {
        AnnoHeader {
            version: le::u32_at(buf, offset + 4),
            corpus_version: le::u64_at(buf, offset + 8),
            comments_count: le::u64_at(buf, offset + 16),
            formatting_count: le::u64_at(buf, offset + 24),
            highlights_count: le::u64_at(buf, offset + 32),
            comments_offset: le::u64_at(buf, offset + 40),
            formatting_offset: le::u64_at(buf, offset + 48),
            highlights_offset: le::u64_at(buf, offset + 56),
        }
    }
}

impl Header for AnnoHeader {
    const MAGIC: [u8; 4] = *b"ANNO";
    const ELEMENT: &'static str = "annotations header";
}

/// A record anchored to a page.
pub trait PageAnchored: Record {
    fn page_id(&self) -> u32;

    fn anchor(&self) -> Range<u32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnoComment {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub flags: u16,
    pub kind: u16,
    pub author_id: u32,
    pub created_at: u64,
    pub updated_at: u64,
    /// Absolute offset of the comment text in the annotations file.
    pub text_offset: u64,
    pub text_length: u32,
}

impl Record for AnnoComment {
    const SIZE: usize = 52;

    fn decode(buf: &[u8], offset: usize) -> Self {
        AnnoComment {
            page_id: le::u32_at(buf, offset),
            anchor_start: le::u32_at(buf, offset + 4),
            anchor_end: le::u32_at(buf, offset + 8),
            flags: le::u16_at(buf, offset + 12),
            kind: le::u16_at(buf, offset + 14),
            author_id: le::u32_at(buf, offset + 16),
            created_at: le::u64_at(buf, offset + 20),
            updated_at: le::u64_at(buf, offset + 28),
            text_offset: le::u64_at(buf, offset + 36),
            text_length: le::u32_at(buf, offset + 44),
        }
    }
}

bitflags! {
    /// Text style bits of a formatting span.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatFlags: u16 {
        const BOLD = 1;
        const ITALIC = 2;
        const UNDERLINE = 4;
        const SMALL_CAPS = 8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnoFormatting {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub flags: FormatFlags,
    pub style_id: u16,
    /// Stacking layer; higher layers win.
    pub layer: u16,
    /// Order within a layer; higher priorities win.
    pub priority: u16,
}

impl Record for AnnoFormatting {
    const SIZE: usize = 24;

    fn decode(buf: &[u8], offset: usize) -> Self {
        AnnoFormatting {
            page_id: le::u32_at(buf, offset),
            anchor_start: le::u32_at(buf, offset + 4),
            anchor_end: le::u32_at(buf, offset + 8),
            flags: FormatFlags::from_bits_retain(le::u16_at(buf, offset + 12)),
            style_id: le::u16_at(buf, offset + 14),
            layer: le::u16_at(buf, offset + 16),
            priority: le::u16_at(buf, offset + 18),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HighlightFlags: u16 {
        /// The highlight was removed and must be ignored.
        const DELETED = 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnoHighlight {
    pub page_id: u32,
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub flags: HighlightFlags,
    pub color_id: u16,
    pub category_id: u16,
    pub author_id: u32,
    pub created_at: u64,
    pub updated_at: u64,
    pub comment_ref_offset: u64,
}

impl Record for AnnoHighlight {
    const SIZE: usize = 48;

    fn decode(buf: &[u8], offset: usize) -> Self {
        AnnoHighlight {
            page_id: le::u32_at(buf, offset),
            anchor_start: le::u32_at(buf, offset + 4),
            anchor_end: le::u32_at(buf, offset + 8),
            flags: HighlightFlags::from_bits_retain(le::u16_at(buf, offset + 12)),
            color_id: le::u16_at(buf, offset + 14),
            category_id: le::u16_at(buf, offset + 16),
            author_id: le::u32_at(buf, offset + 20),
            created_at: le::u64_at(buf, offset + 24),
            updated_at: le::u64_at(buf, offset + 32),
            comment_ref_offset: le::u64_at(buf, offset + 40),
        }
    }
}

impl AnnoHighlight {
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(HighlightFlags::DELETED)
    }
}

macro_rules! impl_page_anchored {
    ($($ty:ty),*) => {
        $(
            impl PageAnchored for $ty {
                fn page_id(&self) -> u32 {
                    self.page_id
                }

                fn anchor(&self) -> Range<u32> {
                    self.anchor_start..self.anchor_end
                }
            }
        )*
    };
}

impl_page_anchored!(AnnoComment, AnnoFormatting, AnnoHighlight);

/// Index range of the records of `page_id` in a page-sorted table.
pub fn page_range<R: PageAnchored>(table: &RecordTable<R>, page_id: u32) -> Range<usize> {
    let first = table.partition_point(|r| r.page_id() < page_id);
    let end = first
        + table
            .iter()
            .skip(first)
            .take_while(|r| r.page_id() == page_id)
            .count();
    first..end
}

/// Read-only view over a whole `annotations.bin` buffer.
#[derive(Clone, Copy)]
pub struct AnnotationsFile<'a> {
    buf: &'a [u8],
    header: AnnoHeader,
    comments: RecordTable<'a, AnnoComment>,
    formatting: RecordTable<'a, AnnoFormatting>,
    highlights: RecordTable<'a, AnnoHighlight>,
}

impl<'a> AnnotationsFile<'a> {
    pub fn open(buf: &'a [u8]) -> Result<AnnotationsFile<'a>> {
        let header = AnnoHeader::parse(buf)?;
        Ok(AnnotationsFile {
            buf,
            header,
            comments: Self::table(
                buf,
                header.comments_offset,
                header.comments_count,
                "annotation comments",
            )?,
            formatting: Self::table(
                buf,
                header.formatting_offset,
                header.formatting_count,
                "annotation formatting",
            )?,
            highlights: Self::table(
                buf,
                header.highlights_offset,
                header.highlights_count,
                "annotation highlights",
            )?,
        })
    }

    /// An array with a zero count or a zero offset is absent.
    fn table<R: Record>(
        buf: &'a [u8],
        offset: u64,
        count: u64,
        element: &str,
    ) -> Result<RecordTable<'a, R>> {
        if count == 0 || offset == 0 {
            RecordTable::new(buf, 0, 0, element)
        } else {
            RecordTable::new(buf, offset, count, element)
        }
    }

    pub fn header(&self) -> &AnnoHeader {
        &self.header
    }

    pub fn comments(&self) -> RecordTable<'a, AnnoComment> {
        self.comments
    }

    pub fn formatting(&self) -> RecordTable<'a, AnnoFormatting> {
        self.formatting
    }

    pub fn highlights(&self) -> RecordTable<'a, AnnoHighlight> {
        self.highlights
    }

    /// `(first, count)` of the comments of `page_id`.
    pub fn find_comments(&self, page_id: u32) -> (usize, usize) {
        first_count(page_range(&self.comments, page_id))
    }

    /// `(first, count)` of the formatting spans of `page_id`.
    pub fn find_formatting(&self, page_id: u32) -> (usize, usize) {
        first_count(page_range(&self.formatting, page_id))
    }

    /// `(first, count)` of the highlights of `page_id`, deleted ones included.
    pub fn find_highlights(&self, page_id: u32) -> (usize, usize) {
        first_count(page_range(&self.highlights, page_id))
    }

    pub fn page_comments(&self, page_id: u32) -> impl Iterator<Item = AnnoComment> + use<'a> {
        let range = page_range(&self.comments, page_id);
        let table = self.comments;
        range.map(move |i| table.get(i))
    }

    pub fn page_formatting(&self, page_id: u32) -> impl Iterator<Item = AnnoFormatting> + use<'a> {
        let range = page_range(&self.formatting, page_id);
        let table = self.formatting;
        range.map(move |i| table.get(i))
    }

    /// Live highlights of `page_id`; deleted highlights are skipped.
    pub fn page_highlights(&self, page_id: u32) -> impl Iterator<Item = AnnoHighlight> + use<'a> {
        let range = page_range(&self.highlights, page_id);
        let table = self.highlights;
        range.map(move |i| table.get(i)).filter(|h| !h.is_deleted())
    }

    pub fn comment_text(&self, comment: &AnnoComment) -> Result<Cow<'a, str>> {
        let end = comment.text_offset.checked_add(comment.text_length as u64);
        match end {
            Some(end) if end <= self.buf.len() as u64 => Ok(le::str_at(
                self.buf,
                comment.text_offset as usize,
                comment.text_length as usize,
            )),
            _ => Err(Error::invalid_format(
                "annotation comment text",
                format!(
                    "{} bytes at {} beyond {} bytes",
                    comment.text_length,
                    comment.text_offset,
                    self.buf.len()
                ),
            )),
        }
    }
}

fn first_count(range: Range<usize>) -> (usize, usize) {
    if range.is_empty() {
        (0, 0)
    } else {
        (range.start, range.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Builder {
        buf: Vec<u8>,
    }

    impl Builder {
        fn u16(&mut self, v: u16) -> &mut Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn u32(&mut self, v: u32) -> &mut Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn u64(&mut self, v: u64) -> &mut Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }
    }

    /// Comments on pages [2, 5, 5], formatting on [5], highlights on [5, 5, 9].
    fn annotations_bytes() -> Vec<u8> {
        let comments_offset = 96u64;
        let formatting_offset = comments_offset + 3 * 52;
        let highlights_offset = formatting_offset + 24;
        let text_offset = highlights_offset + 3 * 48;

        let mut b = Builder { buf: Vec::new() };
        b.buf.extend_from_slice(b"ANNO");
        b.u32(1).u64(42).u64(3).u64(1).u64(3);
        b.u64(comments_offset).u64(formatting_offset).u64(highlights_offset);
        b.buf.resize(96, 0);

        for (page, text_at, len) in [(2u32, 0u64, 4u32), (5, 4, 10), (5, 14, 0)] {
            b.u32(page).u32(1).u32(3).u16(0).u16(1).u32(7);
            b.u64(100).u64(200).u64(text_offset + text_at).u32(len).u32(0);
        }
        b.u32(5).u32(0).u32(10).u16(1).u16(3).u16(1).u16(2).u32(0);
        for (page, flags, color) in [(5u32, 0u16, 3u16), (5, 1, 4), (9, 0, 5)] {
            b.u32(page).u32(4).u32(6).u16(flags).u16(color).u16(11).u16(0);
            b.u32(7).u64(0).u64(0).u64(0);
        }
        b.buf.extend_from_slice("noteتعليق".as_bytes());
        b.buf
    }

    #[test]
    fn test_open_annotations() {
        let buf = annotations_bytes();
        let anno = AnnotationsFile::open(&buf).unwrap();
        assert_eq!(anno.header().corpus_version, 42);
        assert_eq!(anno.comments().len(), 3);
        assert_eq!(anno.formatting().len(), 1);
        assert_eq!(anno.highlights().len(), 3);

        let fmt = anno.formatting().get(0);
        assert_eq!(fmt.flags, FormatFlags::BOLD);
        assert_eq!((fmt.style_id, fmt.layer, fmt.priority), (3, 1, 2));
        assert_eq!(fmt.anchor(), 0..10);
    }

    #[test]
    fn test_find_for_page() {
        let buf = annotations_bytes();
        let anno = AnnotationsFile::open(&buf).unwrap();
        assert_eq!(anno.find_comments(2), (0, 1));
        assert_eq!(anno.find_comments(5), (1, 2));
        assert_eq!(anno.find_comments(3), (0, 0));
        assert_eq!(anno.find_comments(100), (0, 0));
        assert_eq!(anno.find_formatting(5), (0, 1));
        assert_eq!(anno.find_highlights(5), (0, 2));
        assert_eq!(anno.find_highlights(9), (2, 1));

        let live: Vec<u16> = anno.page_highlights(5).map(|h| h.color_id).collect();
        assert_eq!(live, [3]);
        assert!(anno.highlights().get(1).is_deleted());
    }

    #[test]
    fn test_comment_text() {
        let buf = annotations_bytes();
        let anno = AnnotationsFile::open(&buf).unwrap();
        let texts: Vec<String> = anno
            .page_comments(5)
            .map(|c| anno.comment_text(&c).unwrap().into_owned())
            .collect();
        assert_eq!(texts, ["تعليق", ""]);

        let mut bad = anno.comments().get(0);
        bad.text_length = 10_000;
        assert!(anno.comment_text(&bad).unwrap_err().is_format());
    }

    #[test]
    fn test_absent_arrays() {
        let mut buf = b"ANNO".to_vec();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.resize(96, 0);
        let anno = AnnotationsFile::open(&buf).unwrap();
        assert!(anno.comments().is_empty());
        assert_eq!(anno.find_formatting(0), (0, 0));
        assert_eq!(anno.page_highlights(0).count(), 0);
    }
}
