//! Byte access for the object stores.
//!
//! Stores hand out [`ReadAt`] sources: shared buffers ([`memory`]) and local files
//! ([`FileReader`]). Offline stores persist their copies through a
//! [`SealingWrite`] ([`FileWriter`]).

use std::{io, ops::Range};

use bytes::Bytes;

pub mod file;
pub mod memory;

pub use file::{FileReader, FileWriter};

/// Random access to an immutable byte source.
pub trait ReadAt: Send + Sync + 'static {
    fn size(&self) -> io::Result<u64>;

    /// Reads `range`, cut short at the end of the source. A range that starts at or
    /// past the end yields an empty buffer; an inverted range is `InvalidInput`.
    fn read_at(&self, range: Range<u64>) -> io::Result<Bytes>;

    /// Reads all of `range`, failing with `UnexpectedEof` if the source ends first.
    fn read_exact_at(&self, range: Range<u64>) -> io::Result<Bytes> {
        let wanted = range.end.saturating_sub(range.start);
        let buf = self.read_at(range.clone())?;
        if (buf.len() as u64) < wanted {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "source ends {} bytes into {}..{}",
                    buf.len(),
                    range.start,
                    range.end
                ),
            ));
        }
        Ok(buf)
    }

    /// The whole source.
    fn read_all(&self) -> io::Result<Bytes> {
        self.read_exact_at(0..self.size()?)
    }
}

/// A sequential sink whose content only counts once [`seal`](Self::seal) succeeds.
pub trait SealingWrite: Send {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Commits what was written. Writing or sealing again fails.
    fn seal(&mut self) -> io::Result<()>;
}

/// Clips `range` to a source of `size` bytes.
pub(crate) fn clip(range: Range<u64>, size: u64) -> io::Result<Range<u64>> {
    if range.start > range.end {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("inverted range {}..{}", range.start, range.end),
        ));
    }
    let end = range.end.min(size);
    Ok(range.start.min(end)..end)
}
