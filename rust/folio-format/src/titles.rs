//! `titles.bin`: a table of string records followed by a shared strings blob.

use std::borrow::Cow;

use folio_common::{Result, error::Error};

use crate::{Header, Record, RecordTable, le};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitlesHeader {
    pub version: u32,
    pub title_count: u32,
    /// Absolute offset of the strings blob.
    pub strings_offset: u64,
}

impl Record for TitlesHeader {
    const SIZE: usize = 24;

    fn decode(buf: &[u8], offset: usize) -> Self {
        TitlesHeader {
            version: le::u32_at(buf, offset + 4),
            title_count: le::u32_at(buf, offset + 8),
            strings_offset: le::u64_at(buf, offset + 16),
        }
    }
}

impl Header for TitlesHeader {
    const MAGIC: [u8; 4] = *b"TTLB";
    const ELEMENT: &'static str = "titles header";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleEntry {
    /// Offset relative to the strings blob.
    pub offset: u64,
    pub length: u32,
    pub flags: u32,
}

impl Record for TitleEntry {
    const SIZE: usize = 16;

    fn decode(buf: &[u8], offset: usize) -> Self {
        TitleEntry {
            offset: le::u64_at(buf, offset),
            length: le::u32_at(buf, offset + 8),
            flags: le::u32_at(buf, offset + 12),
        }
    }
}

/// Read-only view over a whole `titles.bin` buffer.
#[derive(Clone, Copy)]
pub struct TitlesFile<'a> {
    buf: &'a [u8],
    header: TitlesHeader,
    entries: RecordTable<'a, TitleEntry>,
}

impl<'a> TitlesFile<'a> {
    pub fn open(buf: &'a [u8]) -> Result<TitlesFile<'a>> {
        let header = TitlesHeader::parse(buf)?;
        let entries = RecordTable::new(
            buf,
            TitlesHeader::SIZE as u64,
            header.title_count as u64,
            "titles table",
        )?;
        Ok(TitlesFile {
            buf,
            header,
            entries,
        })
    }

    pub fn header(&self) -> &TitlesHeader {
        &self.header
    }

    pub fn entries(&self) -> RecordTable<'a, TitleEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves title `index`; `None` if there is no such entry.
    pub fn title(&self, index: usize) -> Result<Option<Cow<'a, str>>> {
        let Some(entry) = self.entries.try_get(index) else {
            return Ok(None);
        };
        let start = self.header.strings_offset.checked_add(entry.offset);
        let end = start.and_then(|start| start.checked_add(entry.length as u64));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.buf.len() as u64 => Ok(Some(le::str_at(
                self.buf,
                start as usize,
                entry.length as usize,
            ))),
            _ => Err(Error::invalid_format(
                "titles strings",
                format!(
                    "title {index} at {}+{} ({} bytes) beyond {} bytes",
                    self.header.strings_offset,
                    entry.offset,
                    entry.length,
                    self.buf.len()
                ),
            )),
        }
    }
}
