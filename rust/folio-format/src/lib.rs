//! Binary schema catalog of the folio corpus files.
//!
//! Every corpus file starts with a fixed-size header whose first four bytes are an
//! ASCII magic identifying the file kind, followed by a `u32` format version. The
//! remainder of each file is made of packed, fixed-stride little-endian record tables
//! and, for some files, string or payload blobs addressed by absolute offsets.
//!
//! This crate provides:
//! - a typed record for every header and table entry, with a pure decoder
//!   ([`Record::decode`]) and bit-exact layout constants;
//! - header decoders that validate size, magic and version ([`Header::parse`]);
//! - read-only views over whole file buffers ([`books::BooksFile`],
//!   [`pages::PagesIndex`], [`annotations::AnnotationsFile`], ...);
//! - the 64-bit hash that keys the word dictionary ([`hash`]).
//!
//! Nothing here performs I/O: all functions borrow caller-owned buffers.
//!
//! Decoding a table entry outside of the caller's buffer is a contract violation and
//! panics. Malformed headers, and tables that do not fit in the buffer they are
//! declared in, are reported as format errors.

pub mod annotations;
pub mod books;
pub mod chapters;
pub mod hash;
pub mod le;
pub mod pages;
pub mod postings;
pub mod record;
pub mod titles;
pub mod words;

pub use record::{Header, Record, RecordTable, entry};

/// The only format version this reader understands.
pub const FORMAT_VERSION: u32 = 1;
