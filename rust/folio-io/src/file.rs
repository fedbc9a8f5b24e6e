//! Local files: [`FileReader`] serves positional reads and [`FileWriter`] syncs
//! its file to disk when sealed.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    ops::Range,
    path::Path,
};

use bytes::{Bytes, BytesMut};

use crate::{ReadAt, SealingWrite, clip};

pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    /// Opens `path`. The length is taken once: corpus files never change.
    pub fn open(path: impl AsRef<Path>) -> io::Result<FileReader> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(FileReader { file, size })
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> io::Result<u64> {
        Ok(self.size)
    }

    fn read_at(&self, range: Range<u64>) -> io::Result<Bytes> {
        let range = clip(range, self.size)?;
        let mut buf = BytesMut::zeroed((range.end - range.start) as usize);
        fill_at(&self.file, range.start, &mut buf)?;
        Ok(buf.freeze())
    }
}

#[cfg(unix)]
fn fill_at(file: &File, pos: u64, buf: &mut [u8]) -> io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, pos)
}

#[cfg(windows)]
fn fill_at(file: &File, mut pos: u64, mut buf: &mut [u8]) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        let n = file.seek_read(buf, pos)?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf = &mut std::mem::take(&mut buf)[n..];
        pos += n as u64;
    }
    Ok(())
}

/// Buffered writer of a new file.
pub struct FileWriter {
    out: Option<BufWriter<File>>,
}

impl FileWriter {
    /// Creates `path`, truncating an existing file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<FileWriter> {
        Ok(FileWriter {
            out: Some(BufWriter::new(File::create(path)?)),
        })
    }
}

fn sealed() -> io::Error {
    io::Error::other("file writer already sealed")
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.out.as_mut().ok_or_else(sealed)?.write_all(buf)
    }

    fn seal(&mut self) -> io::Result<()> {
        let out = self.out.take().ok_or_else(sealed)?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use crate::{FileReader, FileWriter, ReadAt, SealingWrite};

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.idx");

        let mut writer = FileWriter::create(&path).unwrap();
        writer.write_all(b"PGIX").unwrap();
        for page in 0u32..15 {
            writer.write_all(&page.to_le_bytes()).unwrap();
        }
        writer.seal().unwrap();
        assert!(writer.write_all(b"more").is_err());
        assert!(writer.seal().is_err());

        let reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.size().unwrap(), 64);
        assert_eq!(reader.read_at(0..4).unwrap().as_ref(), b"PGIX");
        assert_eq!(reader.read_at(8..12).unwrap().as_ref(), 1u32.to_le_bytes());
        assert_eq!(reader.read_at(60..80).unwrap().as_ref(), 14u32.to_le_bytes());
        assert!(reader.read_at(64..70).unwrap().is_empty());
        assert_eq!(reader.read_all().unwrap().len(), 64);
        assert_eq!(
            reader.read_exact_at(60..68).unwrap_err().kind(),
            ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileReader::open(dir.path().join("books.bin")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
