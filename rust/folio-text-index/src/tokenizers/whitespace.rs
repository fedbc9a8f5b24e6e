//! Whitespace Tokenizer - splits on Unicode whitespace and keeps terms verbatim.

use std::{borrow::Cow, str::SplitWhitespace};

use super::{Tokenizer, TokenizerKind};

#[derive(Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

pub struct WhitespaceTokenIterator<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Iterator for WhitespaceTokenIterator<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Cow::Borrowed)
    }
}

impl Tokenizer for WhitespaceTokenizer {
    type TokenIter<'a> = WhitespaceTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        WhitespaceTokenIterator {
            inner: input.split_whitespace(),
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Whitespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokenizer() {
        let tokenizer = WhitespaceTokenizer::new();
        let terms: Vec<Cow<str>> = tokenizer.tokenize("  the  cat\tsat\n").collect();
        assert_eq!(terms, ["the", "cat", "sat"]);
        // Punctuation stays attached.
        let terms: Vec<Cow<str>> = tokenizer.tokenize("cat, dog.").collect();
        assert_eq!(terms, ["cat,", "dog."]);
        // U+3000 ideographic space is whitespace.
        assert_eq!(tokenizer.tokenize("a\u{3000}b").count(), 2);
        assert_eq!(tokenizer.tokenize(" \t ").count(), 0);
    }
}
