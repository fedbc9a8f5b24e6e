//! `postings.bin`: the postings store.
//!
//! After the header, posting lists are stored back to back. Each list is a `u32`
//! byte-length prefix followed by `doc_count: u32` and `doc_count` repetitions of
//! `(doc_id_delta: u32, term_freq: u32, positions: term_freq x u32)`. Lists are
//! addressed by the absolute offsets recorded in the word dictionary; decoding them
//! belongs to the text index.
//!
//! Files whose header carries [`PostingsFlags::COMPRESSED`] are rejected.

use bitflags::bitflags;
use folio_common::{Result, error::Error};

use crate::{Header, Record, RecordTable, le};

bitflags! {
    /// Flags of the postings header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PostingsFlags: u32 {
        /// Lists are stored in compressed blocks.
        const COMPRESSED = 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingsHeader {
    pub version: u32,
    pub flags: PostingsFlags,
    pub total_postings: u64,
    pub block_count: u64,
    pub block_index_offset: u64,
    pub blocks_data_offset: u64,
}

impl Record for PostingsHeader {
    const SIZE: usize = 52;

    fn decode(buf: &[u8], offset: usize) -> Self {
        PostingsHeader {
            version: le::u32_at(buf, offset + 4),
            flags: PostingsFlags::from_bits_retain(le::u32_at(buf, offset + 8)),
            total_postings: le::u64_at(buf, offset + 20),
            block_count: le::u64_at(buf, offset + 28),
            block_index_offset: le::u64_at(buf, offset + 36),
            blocks_data_offset: le::u64_at(buf, offset + 44),
        }
    }
}

impl Header for PostingsHeader {
    const MAGIC: [u8; 4] = *b"PSTB";
    const ELEMENT: &'static str = "postings header";
}

impl PostingsHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(PostingsFlags::COMPRESSED)
    }

    /// Fails with an unsupported feature error if the lists are compressed.
    pub fn ensure_stored(&self) -> Result<()> {
        if self.is_compressed() {
            return Err(Error::unsupported(
                Self::ELEMENT,
                "compressed postings blocks",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingsBlockIndexEntry {
    pub first_word_id: u64,
    pub last_word_id: u64,
    pub uncompressed_size: u64,
    pub compressed_offset: u64,
    pub compressed_size: u64,
}

impl Record for PostingsBlockIndexEntry {
    const SIZE: usize = 40;

    fn decode(buf: &[u8], offset: usize) -> Self {
        PostingsBlockIndexEntry {
            first_word_id: le::u64_at(buf, offset),
            last_word_id: le::u64_at(buf, offset + 8),
            uncompressed_size: le::u64_at(buf, offset + 16),
            compressed_offset: le::u64_at(buf, offset + 24),
            compressed_size: le::u64_at(buf, offset + 32),
        }
    }
}

/// Read-only view over a whole, uncompressed `postings.bin` buffer.
#[derive(Clone, Copy)]
pub struct PostingsFile<'a> {
    buf: &'a [u8],
    header: PostingsHeader,
}

impl<'a> PostingsFile<'a> {
    /// Validates the header.
    ///
    /// # Errors
    ///
    /// A format error for a malformed header; an unsupported feature error if the
    /// file is compressed.
    pub fn open(buf: &'a [u8]) -> Result<PostingsFile<'a>> {
        let header = PostingsHeader::parse(buf)?;
        header.ensure_stored()?;
        Ok(PostingsFile { buf, header })
    }

    pub fn header(&self) -> &PostingsHeader {
        &self.header
    }

    /// The whole file, for list decoding at absolute offsets.
    pub fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    /// The block index table; empty for files written without blocks.
    pub fn blocks(&self) -> Result<RecordTable<'a, PostingsBlockIndexEntry>> {
        if self.header.block_count == 0 {
            return RecordTable::new(self.buf, 0, 0, "postings block index");
        }
        RecordTable::new(
            self.buf,
            self.header.block_index_offset,
            self.header.block_count,
            "postings block index",
        )
    }
}
