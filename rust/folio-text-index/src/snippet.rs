//! Context snippets around a verbatim query occurrence in page text.

/// Bytes of context kept on each side of the match by default.
pub const DEFAULT_CONTEXT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet<'a> {
    pub before: &'a str,
    pub matched: &'a str,
    pub after: &'a str,
    /// Byte offset of the match in the page text.
    pub offset: usize,
}

/// Finds the first byte-exact occurrence of `query` in `text` and cuts up to
/// `context` bytes on each side, never splitting a character.
///
/// The raw query is matched, not its terms: a query that the tokenizer rewrote
/// (normalization, punctuation) may have hits without a snippet.
pub fn snippet<'a>(text: &'a str, query: &str, context: usize) -> Option<Snippet<'a>> {
    if query.is_empty() {
        return None;
    }
    let start = text.find(query)?;
    let end = start + query.len();

    let mut head = start.saturating_sub(context);
    while !text.is_char_boundary(head) {
        head += 1;
    }
    let mut tail = end.saturating_add(context).min(text.len());
    while !text.is_char_boundary(tail) {
        tail -= 1;
    }
    Some(Snippet {
        before: &text[head..start],
        matched: &text[start..end],
        after: &text[end..tail],
        offset: start,
    })
}
