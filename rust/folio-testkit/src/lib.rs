//! Test utilities for the folio crates.
//!
//! This crate provides:
//! - writers producing every corpus file kind from plain Rust values ([`writers`]);
//! - a [`corpus::CorpusBuilder`] assembling a complete, consistent corpus from
//!   books, chapters, pages and annotations, ready to be served from memory or
//!   written to a directory.
//!
//! # Usage
//!
//! This crate is intended for use within the folio test suites and development
//! tools only.

pub mod corpus;
pub mod writers;

pub use corpus::{CorpusBuilder, CorpusFiles, sample_corpus};
