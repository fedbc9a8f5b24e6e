//! Unicode Word Tokenizer - splits on UAX #29 word boundaries.

use std::borrow::Cow;

use unicode_segmentation::{UnicodeSegmentation, UnicodeWords};

use super::{Tokenizer, TokenizerKind};

/// Yields the words of the input as defined by Unicode word boundaries; runs of
/// punctuation and whitespace between words are dropped.
#[derive(Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

pub struct WordTokenIterator<'a> {
    words: UnicodeWords<'a>,
}

impl<'a> Iterator for WordTokenIterator<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        self.words.next().map(Cow::Borrowed)
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = WordTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        WordTokenIterator {
            words: input.unicode_words(),
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_words() {
        let tokenizer = UnicodeWordTokenizer::new();
        let terms: Vec<Cow<str>> = tokenizer.tokenize("The cat, the hat!").collect();
        assert_eq!(terms, ["The", "cat", "the", "hat"]);

        let terms: Vec<Cow<str>> = tokenizer.tokenize("كتاب (الأم)").collect();
        assert_eq!(terms, ["كتاب", "الأم"]);

        assert_eq!(tokenizer.tokenize("... -- !!").count(), 0);
    }
}
