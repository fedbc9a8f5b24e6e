//! Posting-list codec.
//!
//! A stored list is a `u32` byte-length prefix followed by that many bytes:
//!
//! ```text
//! doc_count: u32
//! doc_count x (doc_id_delta: u32, term_freq: u32, term_freq x position_delta: u32)
//! ```
//!
//! Page ids are the running sum of the doc deltas over the list; positions are the
//! running sum of the position deltas, restarting from zero for every page. Zero
//! deltas are legal and kept as is.

use folio_common::{Result, error::Error, verify_data};
use folio_format::{
    Header, Record, le,
    postings::{PostingsFile, PostingsHeader},
};
use folio_objectstore::ResourceAccess;

const ELEMENT: &str = "posting list";

/// Occurrences of one term in one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub page_id: u32,
    pub term_freq: u32,
    /// Token positions of the term in the page, ascending.
    pub positions: Vec<u32>,
}

/// Postings of one term, sorted ascending by page id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    entries: Vec<Posting>,
}

impl PostingList {
    /// Wraps entries already sorted by page id.
    pub fn new(entries: Vec<Posting>) -> PostingList {
        PostingList { entries }
    }

    pub fn empty() -> PostingList {
        PostingList::default()
    }

    /// Decodes the list stored at absolute `offset` of a postings file.
    ///
    /// # Errors
    ///
    /// A format error if the length prefix or the list body does not fit in the
    /// file, or if the body is truncated.
    pub fn read(postings: &PostingsFile, offset: u64) -> Result<PostingList> {
        PostingList::parse(list_block(postings.bytes(), offset)?)
    }

    /// Decodes the list at `offset` with range loads of the header, the length
    /// prefix and the body.
    ///
    /// # Errors
    ///
    /// An unsupported feature error if the header marks the file as compressed.
    pub fn read_ranged(
        access: &dyn ResourceAccess,
        name: &str,
        offset: u64,
    ) -> Result<PostingList> {
        let header = access.load_range(name, 0, PostingsHeader::SIZE as u64)?;
        PostingsHeader::parse(&header)?.ensure_stored()?;
        let prefix = access.load_range(name, offset, 4)?;
        let len = le::u32_at(&prefix, 0) as u64;
        verify_data!(ELEMENT, len != 0);
        let block = access.load_range(name, offset + 4, len)?;
        PostingList::parse(&block)
    }

    /// Decodes a list body (the bytes after the length prefix).
    pub fn parse(block: &[u8]) -> Result<PostingList> {
        let cursor = PostingsCursor::new(block)?;
        let mut entries = Vec::with_capacity((cursor.remaining() as usize).min(block.len() / 8));
        for posting in cursor {
            entries.push(posting?);
        }
        Ok(PostingList { entries })
    }

    pub fn entries(&self) -> &[Posting] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Posting> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|p| p.page_id)
    }

    /// Binary search for the posting of `page_id`.
    pub fn find(&self, page_id: u32) -> Option<&Posting> {
        self.entries
            .binary_search_by_key(&page_id, |p| p.page_id)
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// Returns the body of the list whose length prefix is at `offset` in `buf`.
pub fn list_block(buf: &[u8], offset: u64) -> Result<&[u8]> {
    let body_start = offset.checked_add(4);
    verify_data!(
        ELEMENT,
        body_start.is_some_and(|start| start <= buf.len() as u64)
    );
    let len = le::u32_at(buf, offset as usize) as u64;
    verify_data!(ELEMENT, len != 0);
    let start = offset + 4;
    if start + len > buf.len() as u64 {
        return Err(Error::invalid_format(
            ELEMENT,
            format!(
                "list at {offset} declares {len} bytes, file has {}",
                buf.len()
            ),
        ));
    }
    Ok(&buf[start as usize..(start + len) as usize])
}

/// Streaming decoder over a list body, yielding one posting per page.
///
/// A body that ends before the declared counts is reported once as a format error,
/// after which the cursor is exhausted.
pub struct PostingsCursor<'a> {
    block: &'a [u8],
    pos: usize,
    remaining: u32,
    page_id: u32,
}

impl<'a> PostingsCursor<'a> {
    pub fn new(block: &'a [u8]) -> Result<PostingsCursor<'a>> {
        verify_data!(ELEMENT, block.len() >= 4);
        Ok(PostingsCursor {
            block,
            pos: 4,
            remaining: le::u32_at(block, 0),
            page_id: 0,
        })
    }

    /// Number of postings not yet decoded.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn take_u32(&mut self) -> Result<u32> {
        if self.block.len() - self.pos < 4 {
            return Err(Error::invalid_format(
                ELEMENT,
                format!("truncated at byte {} of {}", self.pos, self.block.len()),
            ));
        }
        let value = le::u32_at(self.block, self.pos);
        self.pos += 4;
        Ok(value)
    }

    fn decode_next(&mut self) -> Result<Posting> {
        let delta = self.take_u32()?;
        let term_freq = self.take_u32()?;
        if (self.block.len() - self.pos) / 4 < term_freq as usize {
            return Err(Error::invalid_format(
                ELEMENT,
                format!(
                    "page {} declares {term_freq} positions, {} bytes left",
                    self.page_id.wrapping_add(delta),
                    self.block.len() - self.pos
                ),
            ));
        }
        self.page_id = self.page_id.wrapping_add(delta);
        let mut position = 0u32;
        let mut positions = Vec::with_capacity(term_freq as usize);
        for _ in 0..term_freq {
            position = position.wrapping_add(self.take_u32()?);
            positions.push(position);
        }
        Ok(Posting {
            page_id: self.page_id,
            term_freq,
            positions,
        })
    }
}

impl Iterator for PostingsCursor<'_> {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.decode_next() {
            Ok(posting) => {
                self.remaining -= 1;
                Some(Ok(posting))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}
