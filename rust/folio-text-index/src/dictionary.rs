//! Word dictionary lookup: binary search over entries sorted by `word_hash`.
//!
//! The sort order is a precondition of the file and is not re-verified. Distinct
//! terms with the same 64-bit hash are indistinguishable.

use folio_common::Result;
use folio_format::{
    Header, Record,
    words::{WordDict, WordDictEntry, WordDictHeader},
};
use folio_objectstore::ResourceAccess;

/// Finds the entry of `word_hash` in a whole dictionary.
pub fn lookup(dict: &WordDict, word_hash: u64) -> Option<WordDictEntry> {
    let entries = dict.entries();
    let (mut lo, mut hi) = (0, entries.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let entry = entries.get(mid);
        if entry.word_hash == word_hash {
            return Some(entry);
        } else if entry.word_hash < word_hash {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    None
}

/// Same search as [`lookup`], reading the header and then one entry per step with
/// range loads instead of transferring the whole dictionary.
pub fn lookup_ranged(
    access: &dyn ResourceAccess,
    name: &str,
    word_hash: u64,
) -> Result<Option<WordDictEntry>> {
    let header_buf = access.load_range(name, 0, WordDictHeader::SIZE as u64)?;
    let header = WordDictHeader::parse(&header_buf)?;
    let (mut lo, mut hi) = (0u64, header.entry_count);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let buf = access.load_range(
            name,
            WordDictHeader::entry_offset(mid),
            WordDictEntry::SIZE as u64,
        )?;
        let entry = WordDictEntry::decode(&buf, 0);
        if entry.word_hash == word_hash {
            return Ok(Some(entry));
        } else if entry.word_hash < word_hash {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(None)
}
