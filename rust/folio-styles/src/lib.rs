//! Resolution of overlapping page annotations into flat style runs.
//!
//! A page carries formatting spans (character style bits ordered by layer and
//! priority) and highlight spans (color and category), each anchored on a
//! half-open token range. [`merge`] sweeps over the span boundaries and produces
//! the ordered, non-overlapping, gap-free sequence of [`StyleRun`]s covering
//! `[0, token_count)`.

mod merge;
mod span;

pub use merge::{merge, page_styles};
pub use span::{FormatSpan, HighlightSpan, Style, StyleRun};
