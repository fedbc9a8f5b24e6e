//! Definitions shared by all folio-* crates: the error taxonomy, the `Result` alias
//! and the verification macros used by the decoders.

pub mod error;
pub mod result;

pub use result::Result;
