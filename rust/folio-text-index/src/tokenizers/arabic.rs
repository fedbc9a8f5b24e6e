//! Arabic Tokenizer - orthographic normalization plus delimiter splitting.
//!
//! This is the tokenizer the corpus index is built with. Normalization:
//! - drops harakat and Quranic annotation marks (U+064B..=U+065F, U+06D6..=U+06ED);
//! - folds alef variants (madda, hamza above, hamza below, wasla) to bare alef;
//! - folds alef maksura to yeh and teh marbuta to heh.
//!
//! Terms are separated by ASCII control characters, space and ASCII punctuation;
//! non-ASCII punctuation is part of the term. A term that normalizes to nothing is
//! skipped and does not take a position.

use std::{borrow::Cow, str::Split};

use super::{Tokenizer, TokenizerKind};

const ALEF: char = '\u{0627}';
const YEH: char = '\u{064A}';
const HEH: char = '\u{0647}';

#[derive(Default)]
pub struct ArabicTokenizer;

impl ArabicTokenizer {
    pub fn new() -> Self {
        ArabicTokenizer
    }
}

/// Whether `c` separates terms.
pub fn is_delimiter(c: char) -> bool {
    c <= ' '
        || matches!(
            c,
            ',' | '.'
                | ';'
                | ':'
                | '!'
                | '?'
                | '"'
                | '\''
                | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '-'
                | '_'
                | '/'
                | '\\'
                | '+'
                | '='
                | '*'
                | '&'
                | '%'
                | '$'
                | '#'
                | '@'
                | '<'
                | '>'
        )
}

/// Maps one character through the normalization; `None` drops it.
#[inline]
fn normalize_char(c: char) -> Option<char> {
    match c {
        '\u{064B}'..='\u{065F}' | '\u{06D6}'..='\u{06ED}' => None,
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => Some(ALEF),
        '\u{0649}' => Some(YEH),
        '\u{0629}' => Some(HEH),
        c => Some(c),
    }
}

/// Normalizes `text`, borrowing it when nothing changes.
pub fn normalize(text: &str) -> Cow<'_, str> {
    if text.chars().all(|c| normalize_char(c) == Some(c)) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter_map(normalize_char).collect())
    }
}

pub struct ArabicTokenIterator<'a> {
    pieces: Split<'a, fn(char) -> bool>,
}

impl<'a> Iterator for ArabicTokenIterator<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        for piece in self.pieces.by_ref() {
            if piece.is_empty() {
                continue;
            }
            let term = normalize(piece);
            if !term.is_empty() {
                return Some(term);
            }
        }
        None
    }
}

impl Tokenizer for ArabicTokenizer {
    type TokenIter<'a> = ArabicTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        ArabicTokenIterator {
            pieces: input.split(is_delimiter as fn(char) -> bool),
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Arabic
    }
}
