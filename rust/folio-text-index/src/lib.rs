//! Read side of the folio inverted index.
//!
//! Query text is split into terms by a [`Tokenizer`], each term is hashed
//! ([`folio_format::hash`]) and looked up in the sorted word dictionary
//! ([`dictionary`]), and the resulting posting lists ([`postings`]) are combined:
//! ordered phrase matching ([`phrase`]), boolean AND/OR ([`boolean`]) or scoring
//! ([`rank`]). The [`Searcher`] ties these together over a [`ResourceAccess`] and
//! owns the caches that make repeated queries cheap.
//!
//! [`ResourceAccess`]: folio_objectstore::ResourceAccess

pub mod boolean;
pub mod dictionary;
pub mod phrase;
pub mod postings;
pub mod rank;
pub mod searcher;
pub mod snippet;
mod tokenizers;

pub use postings::{Posting, PostingList};
pub use rank::{RankedHit, ResultPage};
pub use searcher::{Category, Searcher, SearcherOptions};
pub use tokenizers::{Tokenizer, TokenizerKind, TokenizerType, create_tokenizer};
