//! # Folio: read-side engine for immutable full-text corpora
//!
//! A folio corpus is a directory of packed binary files produced by an offline
//! index builder: the page texts (`books.bin`), book, chapter and page tables, a
//! titles table, a hashed word dictionary with its positional postings, and page
//! annotations (comments, formatting, highlights).
//!
//! This crate is the entry point: [`CorpusOptions`] opens a [`Corpus`] over any
//! [`objectstore::ObjectStore`], optionally backed by an offline copy, and the
//! corpus answers page, title, search and style queries. The component crates are
//! re-exported for direct use:
//!
//! * [`common`] - error type and validation macros
//! * [`format`] - binary layouts and the dictionary hash
//! * [`objectstore`] - resource stores and the single-flight loader
//! * [`text_index`] - tokenizers, posting lists, phrase and ranked search
//! * [`styles`] - annotation style runs

mod corpus;
pub mod layout;

pub use corpus::{Corpus, CorpusOptions, PageSnippet};
pub use layout::{CategoryLayout, CorpusLayout};

pub use folio_common as common;
pub use folio_format as format;
pub use folio_objectstore as objectstore;
pub use folio_styles as styles;
pub use folio_text_index as text_index;
