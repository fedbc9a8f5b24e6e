//! [`ReadAt`] over in-memory buffers. Reads from `Bytes` share the buffer; reads
//! from a `Vec<u8>` copy.

use std::{io, ops::Range};

use bytes::Bytes;

use crate::{ReadAt, clip};

impl ReadAt for Bytes {
    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> io::Result<Bytes> {
        let range = clip(range, self.len() as u64)?;
        Ok(self.slice(range.start as usize..range.end as usize))
    }
}

impl ReadAt for Vec<u8> {
    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> io::Result<Bytes> {
        let range = clip(range, self.len() as u64)?;
        Ok(Bytes::copy_from_slice(
            &self[range.start as usize..range.end as usize],
        ))
    }
}
