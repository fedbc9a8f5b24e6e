//! Query execution over a corpus' word dictionaries and postings stores.
//!
//! A [`Searcher`] reads through a [`ResourceAccess`] and owns two caches: the
//! bounded term-hash memo and the decoded posting lists, keyed by postings resource
//! and list offset. Both live as long as the searcher, or until
//! [`Searcher::clear_cache`].

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use folio_common::Result;
use folio_format::{
    hash::{DEFAULT_MEMO_CAPACITY, HashMemo},
    postings::PostingsFile,
    words::{WordDict, WordDictEntry},
};
use folio_objectstore::ResourceAccess;

use crate::{
    dictionary, phrase,
    postings::PostingList,
    rank::{self, RankedHit, ResultPage},
    tokenizers::{Tokenizer, TokenizerKind, TokenizerType, create_tokenizer},
};

/// Query word switching ranked search to any-term mode.
pub const OR_OPERATOR: &str = "OR";

/// A searchable (dictionary, postings) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub dict: String,
    pub postings: String,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        dict: impl Into<String>,
        postings: impl Into<String>,
    ) -> Category {
        Category {
            name: name.into(),
            dict: dict.into(),
            postings: postings.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearcherOptions {
    pub hash_memo_capacity: usize,
    pub tokenizer: TokenizerKind,
}

impl Default for SearcherOptions {
    fn default() -> Self {
        SearcherOptions {
            hash_memo_capacity: DEFAULT_MEMO_CAPACITY,
            tokenizer: TokenizerKind::default(),
        }
    }
}

/// Decoded posting lists by `(postings resource, list offset)`.
#[derive(Default)]
struct PostingsCache {
    lists: RwLock<AHashMap<(String, u64), Arc<PostingList>>>,
}

impl PostingsCache {
    fn get(&self, name: &str, offset: u64) -> Option<Arc<PostingList>> {
        self.lists
            .read()
            .expect("read lock")
            .get(&(name.to_string(), offset))
            .cloned()
    }

    fn put(&self, name: &str, offset: u64, list: Arc<PostingList>) {
        self.lists
            .write()
            .expect("write lock")
            .insert((name.to_string(), offset), list);
    }

    fn len(&self) -> usize {
        self.lists.read().expect("read lock").len()
    }

    fn clear(&self) {
        self.lists.write().expect("write lock").clear();
    }
}

pub struct Searcher {
    access: Arc<dyn ResourceAccess>,
    tokenizer: TokenizerType,
    hashes: HashMemo,
    lists: PostingsCache,
    primary: Category,
}

impl Searcher {
    /// Creates a searcher over the `primary` category with default options.
    pub fn new(access: Arc<dyn ResourceAccess>, primary: Category) -> Searcher {
        Searcher {
            access,
            tokenizer: TokenizerType::default(),
            hashes: HashMemo::new(),
            lists: Default::default(),
            primary,
        }
    }

    pub fn with_options(
        access: Arc<dyn ResourceAccess>,
        primary: Category,
        options: &SearcherOptions,
    ) -> Result<Searcher> {
        Ok(Searcher {
            tokenizer: create_tokenizer(options.tokenizer.name())?,
            hashes: HashMemo::with_capacity(options.hash_memo_capacity),
            ..Searcher::new(access, primary)
        })
    }

    pub fn primary(&self) -> &Category {
        &self.primary
    }

    pub fn tokenizer(&self) -> &TokenizerType {
        &self.tokenizer
    }

    pub fn hash_memo(&self) -> &HashMemo {
        &self.hashes
    }

    /// Number of decoded posting lists held in the cache.
    pub fn cached_lists(&self) -> usize {
        self.lists.len()
    }

    /// Drops the hash memo and the decoded posting lists.
    pub fn clear_cache(&self) {
        self.hashes.clear();
        self.lists.clear();
    }

    /// Tokenizes `query` into owned terms.
    pub fn terms(&self, query: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(query)
            .map(|term| term.into_owned())
            .collect()
    }

    /// Dictionary entry of `term` in `category`.
    pub fn term_entry(&self, category: &Category, term: &str) -> Result<Option<WordDictEntry>> {
        let buf = self.access.load_whole(&category.dict)?;
        let dict = WordDict::open(&buf)?;
        Ok(dictionary::lookup(&dict, self.hashes.hash(term)))
    }

    /// Decoded posting list of `term` in `category`; empty if the term is unknown.
    pub fn term_list(&self, category: &Category, term: &str) -> Result<Arc<PostingList>> {
        self.check_postings(category)?;
        match self.term_entry(category, term)? {
            Some(entry) if entry.postings_count > 0 => self.list_at(category, entry.postings_offset),
            _ => Ok(Arc::new(PostingList::empty())),
        }
    }

    /// Pages containing `term` in the primary category.
    pub fn term_pages(&self, term: &str) -> Result<Vec<u32>> {
        Ok(self.term_list(&self.primary, term)?.page_ids().collect())
    }

    /// Pages of the primary category containing the query terms as a phrase.
    pub fn phrase_search(&self, query: &str) -> Result<Vec<u32>> {
        self.phrase_search_terms(&self.primary, &self.terms(query))
    }

    /// Phrase resolution of already tokenized `terms` in `category`.
    ///
    /// No terms yield nothing. A term missing from the dictionary, or without
    /// postings, short-circuits to an empty result.
    ///
    /// # Errors
    ///
    /// An unsupported feature error if the category's postings are compressed, even
    /// when no list would be read.
    pub fn phrase_search_terms(&self, category: &Category, terms: &[String]) -> Result<Vec<u32>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        self.check_postings(category)?;
        log::debug!(
            "phrase search of {} terms in '{}'",
            terms.len(),
            category.name
        );

        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match self.term_entry(category, term)? {
                Some(entry) if entry.postings_count > 0 => {
                    lists.push(self.list_at(category, entry.postings_offset)?);
                }
                _ => return Ok(Vec::new()),
            }
        }
        Ok(phrase::resolve(&lists))
    }

    /// Scored search over the primary category.
    ///
    /// Without an `OR` word every page must contain every term, and with two or
    /// more terms phrase hits earn a bonus. With `OR` any term suffices.
    pub fn ranked_search(&self, query: &str, window: ResultPage) -> Result<Vec<RankedHit>> {
        let mut terms = self.terms(query);
        let any_term = terms.iter().any(|t| t == OR_OPERATOR);
        terms.retain(|t| t != OR_OPERATOR);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let category = &self.primary;
        let phrase_pages = if !any_term && terms.len() >= 2 {
            self.phrase_search_terms(category, &terms)?
        } else {
            Vec::new()
        };
        let mut lists = Vec::with_capacity(terms.len());
        for term in &terms {
            lists.push(self.term_list(category, term)?);
        }

        let hits = if any_term {
            rank::rank(&lists, &phrase_pages)
        } else {
            rank::rank_all_terms(&lists, &phrase_pages)
        };
        log::debug!("ranked search of {} terms: {} hits", terms.len(), hits.len());
        Ok(window.apply(hits))
    }

    /// Runs the phrase search in every category, in order, and concatenates
    /// `(page_id, category_index)` pairs.
    pub fn search_categories(
        &self,
        query: &str,
        categories: &[Category],
    ) -> Result<Vec<(u32, usize)>> {
        let terms = self.terms(query);
        let mut hits = Vec::new();
        for (index, category) in categories.iter().enumerate() {
            hits.extend(
                self.phrase_search_terms(category, &terms)?
                    .into_iter()
                    .map(|page| (page, index)),
            );
        }
        Ok(hits)
    }

    fn check_postings(&self, category: &Category) -> Result<()> {
        let buf = self.access.load_whole(&category.postings)?;
        PostingsFile::open(&buf).map(|_| ()).inspect_err(|e| {
            if e.is_unsupported() {
                log::warn!("refusing '{}': {e}", category.postings);
            }
        })
    }

    fn list_at(&self, category: &Category, offset: u64) -> Result<Arc<PostingList>> {
        if let Some(list) = self.lists.get(&category.postings, offset) {
            log::trace!("posting list cache hit '{}'@{offset}", category.postings);
            return Ok(list);
        }
        let buf = self.access.load_whole(&category.postings)?;
        let postings = PostingsFile::open(&buf)?;
        let list = Arc::new(PostingList::read(&postings, offset)?);
        self.lists.put(&category.postings, offset, list.clone());
        Ok(list)
    }
}
