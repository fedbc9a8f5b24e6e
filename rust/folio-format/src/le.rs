//! Little-endian field readers.
//!
//! 64-bit fields are assembled from their low and high 32-bit words, which is
//! bit-identical to a native little-endian 64-bit read.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};

#[inline]
pub fn u16_at(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..offset + 2])
}

#[inline]
pub fn u32_at(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..offset + 4])
}

#[inline]
pub fn u64_at(buf: &[u8], offset: usize) -> u64 {
    let lo = u32_at(buf, offset) as u64;
    let hi = u32_at(buf, offset + 4) as u64;
    (hi << 32) | lo
}

#[inline]
pub fn magic_at(buf: &[u8], offset: usize) -> [u8; 4] {
    [
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]
}

/// Decodes exactly `len` bytes at `offset` as UTF-8, replacing invalid sequences.
///
/// No trimming and no NUL termination: the declared length is authoritative.
#[inline]
pub fn str_at(buf: &[u8], offset: usize, len: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(&buf[offset..offset + len])
}
