//! Word files: the word dictionary keyed by term hash (`words.idx`) and the optional
//! words index carrying per-word statistics.
//!
//! Both files share the `WDIX` magic and are told apart by their header shape.

use folio_common::Result;

use crate::{Header, Record, RecordTable, le};

/// Header of the word dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordDictHeader {
    pub version: u32,
    pub entry_count: u64,
}

impl Record for WordDictHeader {
    const SIZE: usize = 20;

    fn decode(buf: &[u8], offset: usize) -> Self {
        WordDictHeader {
            version: le::u32_at(buf, offset + 4),
            entry_count: le::u64_at(buf, offset + 12),
        }
    }
}

impl Header for WordDictHeader {
    const MAGIC: [u8; 4] = *b"WDIX";
    const ELEMENT: &'static str = "word dictionary header";
}

impl WordDictHeader {
    /// Absolute offset of dictionary entry `index`.
    pub fn entry_offset(index: u64) -> u64 {
        Self::SIZE as u64 + index * WordDictEntry::SIZE as u64
    }
}

/// Dictionary entry; the table is sorted ascending by `word_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordDictEntry {
    pub word_hash: u64,
    /// Absolute offset of the posting list in `postings.bin`.
    pub postings_offset: u64,
    /// Total number of occurrences of the word.
    pub postings_count: u64,
}

impl Record for WordDictEntry {
    const SIZE: usize = 24;

    fn decode(buf: &[u8], offset: usize) -> Self {
        WordDictEntry {
            word_hash: le::u64_at(buf, offset),
            postings_offset: le::u64_at(buf, offset + 8),
            postings_count: le::u64_at(buf, offset + 16),
        }
    }
}

/// Read-only view over a whole word dictionary buffer.
#[derive(Clone, Copy)]
pub struct WordDict<'a> {
    header: WordDictHeader,
    entries: RecordTable<'a, WordDictEntry>,
}

impl<'a> WordDict<'a> {
    pub fn open(buf: &'a [u8]) -> Result<WordDict<'a>> {
        let header = WordDictHeader::parse(buf)?;
        let entries = RecordTable::new(
            buf,
            WordDictHeader::SIZE as u64,
            header.entry_count,
            "word dictionary table",
        )?;
        Ok(WordDict { header, entries })
    }

    pub fn header(&self) -> &WordDictHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, WordDictEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Header of the words index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordsIndexHeader {
    pub version: u32,
    pub word_count: u32,
    pub words_bin_size: u64,
    pub postings_file_size: u64,
}

impl Record for WordsIndexHeader {
    const SIZE: usize = 36;

    fn decode(buf: &[u8], offset: usize) -> Self {
        WordsIndexHeader {
            version: le::u32_at(buf, offset + 4),
            word_count: le::u32_at(buf, offset + 8),
            words_bin_size: le::u64_at(buf, offset + 20),
            postings_file_size: le::u64_at(buf, offset + 28),
        }
    }
}

impl Header for WordsIndexHeader {
    const MAGIC: [u8; 4] = *b"WDIX";
    const ELEMENT: &'static str = "words index header";
}

/// Per-word statistics. Not used for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordIndexEntry {
    pub word_id: u32,
    /// Number of pages containing the word.
    pub df: u32,
    /// Number of occurrences of the word.
    pub cf: u32,
    pub postings_count: u32,
    pub postings_block_id: u32,
    pub postings_offset_in_block: u32,
    pub postings_length_in_block: u32,
    pub word_string_offset: u32,
    pub word_string_length: u32,
    pub flags: u32,
}

impl Record for WordIndexEntry {
    const SIZE: usize = 40;

    fn decode(buf: &[u8], offset: usize) -> Self {
        let field = |i: usize| le::u32_at(buf, offset + i * 4);
        WordIndexEntry {
            word_id: field(0),
            df: field(1),
            cf: field(2),
            postings_count: field(3),
            postings_block_id: field(4),
            postings_offset_in_block: field(5),
            postings_length_in_block: field(6),
            word_string_offset: field(7),
            word_string_length: field(8),
            flags: field(9),
        }
    }
}

/// Read-only view over a whole words index buffer.
#[derive(Clone, Copy)]
pub struct WordsIndex<'a> {
    header: WordsIndexHeader,
    entries: RecordTable<'a, WordIndexEntry>,
}

impl<'a> WordsIndex<'a> {
    pub fn open(buf: &'a [u8]) -> Result<WordsIndex<'a>> {
        let header = WordsIndexHeader::parse(buf)?;
        let entries = RecordTable::new(
            buf,
            WordsIndexHeader::SIZE as u64,
            header.word_count as u64,
            "words index table",
        )?;
        Ok(WordsIndex { header, entries })
    }

    pub fn header(&self) -> &WordsIndexHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, WordIndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
