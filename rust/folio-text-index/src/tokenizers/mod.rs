//! Query tokenizers.
//!
//! A tokenizer turns raw query text into the sequence of terms that is hashed and
//! looked up in the word dictionary. Token order matters: phrase matching requires
//! term `t` at position `p + t`, so a tokenizer must yield terms in text order and
//! must not merge or reorder them.
//!
//! The tokenizer used for queries has to agree with the one the index was built
//! with; a term normalized differently hashes differently and matches nothing.

pub mod arabic;
pub mod unicode_word;
pub mod whitespace;

use std::borrow::Cow;

use folio_common::{Result, error::Error};
pub use arabic::ArabicTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;

/// Extracts terms from query text.
///
/// Terms borrow from the input unless the tokenizer had to rewrite them.
pub trait Tokenizer: Send + Sync {
    type TokenIter<'a>: Iterator<Item = Cow<'a, str>>
    where
        Self: 'a;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    fn kind(&self) -> TokenizerKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Creates a tokenizer by name: `whitespace`, `arabic` or `unicode-word`.
///
/// # Errors
///
/// An invalid argument error for an unknown name.
pub fn create_tokenizer(name: &str) -> Result<TokenizerType> {
    match name.try_into()? {
        TokenizerKind::Whitespace => Ok(TokenizerType::Whitespace(WhitespaceTokenizer::new())),
        TokenizerKind::Arabic => Ok(TokenizerType::Arabic(ArabicTokenizer::new())),
        TokenizerKind::UnicodeWord => Ok(TokenizerType::UnicodeWord(UnicodeWordTokenizer::new())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// Splits on Unicode whitespace, terms are kept verbatim.
    #[default]
    Whitespace,
    /// Normalizes Arabic script and splits on ASCII delimiters.
    Arabic,
    /// Splits on Unicode word boundaries.
    UnicodeWord,
}

impl TryFrom<&str> for TokenizerKind {
    type Error = folio_common::error::Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "whitespace" => Ok(TokenizerKind::Whitespace),
            "arabic" => Ok(TokenizerKind::Arabic),
            "unicode-word" => Ok(TokenizerKind::UnicodeWord),
            _ => Err(Error::invalid_arg(
                "name",
                format!("Unrecognized tokenizer: {name}"),
            )),
        }
    }
}

impl TokenizerKind {
    pub const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::Whitespace => "whitespace",
            TokenizerKind::Arabic => "arabic",
            TokenizerKind::UnicodeWord => "unicode-word",
        }
    }
}

/// All available tokenizers behind one type.
pub enum TokenizerType {
    Whitespace(WhitespaceTokenizer),
    Arabic(ArabicTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
}

impl Default for TokenizerType {
    fn default() -> Self {
        TokenizerType::Whitespace(WhitespaceTokenizer::new())
    }
}

impl Tokenizer for TokenizerType {
    type TokenIter<'a> = Box<dyn Iterator<Item = Cow<'a, str>> + 'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        match self {
            TokenizerType::Whitespace(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::Arabic(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::UnicodeWord(tokenizer) => Box::new(tokenizer.tokenize(input)),
        }
    }

    fn kind(&self) -> TokenizerKind {
        match self {
            TokenizerType::Whitespace(tokenizer) => tokenizer.kind(),
            TokenizerType::Arabic(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.kind(),
        }
    }
}
