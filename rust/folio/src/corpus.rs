use std::sync::Arc;

use folio_common::{Result, error::Error};
use folio_format::{
    Header, Record,
    annotations::{AnnoComment, AnnotationsFile},
    books::{BlockIndexEntry, BookIndexEntry, BooksFile, BooksHeader, BooksIndex, page_text_range},
    chapters::{ChapterIndexEntry, ChaptersIndex},
    pages::{PageIndexEntry, PagesIndex},
    titles::TitlesFile,
};
use folio_objectstore::{
    ObjectStore, OfflineStore, ResourceAccess, ResourceLoader, loader::OfflineInfo,
};
use folio_styles::StyleRun;
use folio_text_index::{
    Category, RankedHit, ResultPage, Searcher, SearcherOptions, TokenizerKind,
    snippet::{self, DEFAULT_CONTEXT},
};
use serde::Serialize;

use crate::layout::CorpusLayout;

/// A query match with its surrounding page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSnippet {
    pub page_id: u32,
    pub before: String,
    pub matched: String,
    pub after: String,
}

/// Read access to one corpus.
///
/// All lookups go through a shared [`ResourceLoader`], so every file is fetched at
/// most once until [`Corpus::clear_cache`]. Cloning is cheap.
#[derive(Clone)]
pub struct Corpus(Arc<CorpusContext>);

struct CorpusContext {
    loader: Arc<ResourceLoader>,
    layout: CorpusLayout,
    searcher: Searcher,
    categories: Vec<Category>,
}

impl Corpus {
    pub fn layout(&self) -> &CorpusLayout {
        &self.0.layout
    }

    pub fn loader(&self) -> &Arc<ResourceLoader> {
        &self.0.loader
    }

    pub fn searcher(&self) -> &Searcher {
        &self.0.searcher
    }

    /// Search categories: the primary one, then those of the layout.
    pub fn categories(&self) -> &[Category] {
        &self.0.categories
    }

    fn load(&self, name: &str) -> Result<bytes::Bytes> {
        self.0.loader.load_whole(name)
    }

    /// Page table entry of `page_id`; `None` for an unknown page.
    pub fn page(&self, page_id: u32) -> Result<Option<PageIndexEntry>> {
        let buf = self.load(&self.0.layout.pages_index)?;
        Ok(PagesIndex::open(&buf)?.find(page_id))
    }

    /// Number of pages in the corpus.
    pub fn page_count(&self) -> Result<usize> {
        let buf = self.load(&self.0.layout.pages_index)?;
        Ok(PagesIndex::open(&buf)?.len())
    }

    /// Text of `page_id`, reading the whole books container.
    ///
    /// # Errors
    ///
    /// Unsupported feature if the books container is compressed.
    pub fn page_text(&self, page_id: u32) -> Result<Option<String>> {
        let Some(page) = self.page(page_id)? else {
            return Ok(None);
        };
        let buf = self.load(&self.0.layout.books)?;
        let books = BooksFile::open(&buf).inspect_err(|e| self.log_unsupported(e))?;
        let text = books
            .page_text(&page)
            .inspect_err(|e| self.log_unsupported(e))?;
        Ok(Some(text.into_owned()))
    }

    /// Text of `page_id`, reading only the books header, the page's block entry and
    /// the text itself.
    pub fn page_text_ranged(&self, page_id: u32) -> Result<Option<String>> {
        let Some(page) = self.page(page_id)? else {
            return Ok(None);
        };
        let name = &self.0.layout.books;
        let loader = &self.0.loader;

        let head = loader.load_range(name, 0, BooksHeader::SIZE as u64)?;
        let header = BooksHeader::parse(&head)?;
        header
            .ensure_stored()
            .inspect_err(|e| self.log_unsupported(e))?;
        if page.block_id as u64 >= header.block_count {
            return Err(Error::invalid_format(
                "books block index",
                format!(
                    "page {} refers to block {} of {}",
                    page.page_id, page.block_id, header.block_count
                ),
            ));
        }
        let entry = loader.load_range(
            name,
            header.block_entry_offset(page.block_id),
            BlockIndexEntry::SIZE as u64,
        )?;
        let block = BlockIndexEntry::decode(&entry, 0);
        let range = page_text_range(&header, &block, &page)?;
        let text = loader.load_range(name, range.start, range.end - range.start)?;
        Ok(Some(String::from_utf8_lossy(&text).into_owned()))
    }

    /// Book table entry of `book_id`.
    pub fn book(&self, book_id: u32) -> Result<Option<BookIndexEntry>> {
        let buf = self.load(&self.0.layout.books_index)?;
        Ok(BooksIndex::open(&buf)?.find(book_id))
    }

    pub fn books(&self) -> Result<Vec<BookIndexEntry>> {
        let buf = self.load(&self.0.layout.books_index)?;
        Ok(BooksIndex::open(&buf)?.entries().iter().collect())
    }

    /// Chapter table entry of `chapter_id`.
    pub fn chapter(&self, chapter_id: u32) -> Result<Option<ChapterIndexEntry>> {
        let buf = self.load(&self.0.layout.chapters_index)?;
        let chapters = ChaptersIndex::open(&buf)?;
        Ok(chapters
            .entries()
            .iter()
            .find(|c| c.chapter_id == chapter_id))
    }

    /// Chapters of `book_id`, in table order.
    pub fn chapters_of(&self, book_id: u32) -> Result<Vec<ChapterIndexEntry>> {
        let buf = self.load(&self.0.layout.chapters_index)?;
        Ok(ChaptersIndex::open(&buf)?.of_book(book_id).collect())
    }

    /// Title at `index` of the titles table.
    pub fn title(&self, index: u32) -> Result<Option<String>> {
        let buf = self.load(&self.0.layout.titles)?;
        let titles = TitlesFile::open(&buf)?;
        Ok(titles.title(index as usize)?.map(|t| t.into_owned()))
    }

    pub fn book_title(&self, book_id: u32) -> Result<Option<String>> {
        match self.book(book_id)? {
            Some(book) => self.title(book.title_index),
            None => Ok(None),
        }
    }

    pub fn chapter_title(&self, chapter_id: u32) -> Result<Option<String>> {
        match self.chapter(chapter_id)? {
            Some(chapter) => self.title(chapter.title_index),
            None => Ok(None),
        }
    }

    /// Pages containing the query terms as a phrase, in page id order.
    pub fn search(&self, query: &str) -> Result<Vec<u32>> {
        log::debug!("search '{query}'");
        self.0.searcher.phrase_search(query)
    }

    /// Scored pages for the query, best first, windowed by `page`.
    pub fn ranked_search(&self, query: &str, page: ResultPage) -> Result<Vec<RankedHit>> {
        log::debug!("ranked search '{query}' {page:?}");
        self.0.searcher.ranked_search(query, page)
    }

    /// Phrase search over every category; pairs of page id and index into
    /// [`Corpus::categories`].
    pub fn search_categories(&self, query: &str) -> Result<Vec<(u32, usize)>> {
        log::debug!(
            "search '{query}' in {} categories",
            self.0.categories.len()
        );
        self.0.searcher.search_categories(query, &self.0.categories)
    }

    /// Snippet of the first verbatim occurrence of `query` in the page text.
    pub fn snippet(&self, page_id: u32, query: &str) -> Result<Option<PageSnippet>> {
        let Some(text) = self.page_text(page_id)? else {
            return Ok(None);
        };
        Ok(
            snippet::snippet(&text, query.trim(), DEFAULT_CONTEXT).map(|s| PageSnippet {
                page_id,
                before: s.before.to_string(),
                matched: s.matched.to_string(),
                after: s.after.to_string(),
            }),
        )
    }

    /// Style runs of `page_id` over `token_count` tokens.
    pub fn page_styles(&self, page_id: u32, token_count: u32) -> Result<Vec<StyleRun>> {
        let buf = self.load(&self.0.layout.annotations)?;
        let anno = AnnotationsFile::open(&buf)?;
        Ok(folio_styles::page_styles(&anno, page_id, token_count))
    }

    /// Comments anchored on `page_id`, in table order.
    pub fn comments(&self, page_id: u32) -> Result<Vec<AnnoComment>> {
        let buf = self.load(&self.0.layout.annotations)?;
        Ok(AnnotationsFile::open(&buf)?.page_comments(page_id).collect())
    }

    pub fn comment_text(&self, comment: &AnnoComment) -> Result<String> {
        let buf = self.load(&self.0.layout.annotations)?;
        let anno = AnnotationsFile::open(&buf)?;
        Ok(anno.comment_text(comment)?.into_owned())
    }

    /// Copies every layout resource into the offline store.
    pub fn download(&self) -> Result<Vec<OfflineInfo>> {
        self.0.loader.download(&self.0.layout.resources())
    }

    /// Offline presence of every layout resource.
    pub fn offline_info(&self) -> Result<Vec<OfflineInfo>> {
        self.0.loader.offline_info(&self.0.layout.resources())
    }

    /// Drops loaded files, decoded posting lists and memoized hashes.
    pub fn clear_cache(&self) {
        log::debug!("clearing corpus caches");
        self.0.loader.clear();
        self.0.searcher.clear_cache();
    }

    fn log_unsupported(&self, e: &Error) {
        if e.is_unsupported() {
            log::warn!("refusing '{}': {e}", self.0.layout.books);
        }
    }
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("layout", &self.0.layout)
            .finish_non_exhaustive()
    }
}

/// Options for opening a [`Corpus`].
pub struct CorpusOptions {
    object_store: Arc<dyn ObjectStore>,
    offline_store: Option<Arc<dyn OfflineStore>>,
    layout: CorpusLayout,
    searcher: SearcherOptions,
}

impl CorpusOptions {
    /// Creates options reading from `object_store` with the default layout.
    pub fn new(object_store: Arc<dyn ObjectStore>) -> CorpusOptions {
        CorpusOptions {
            object_store,
            offline_store: None,
            layout: CorpusLayout::default(),
            searcher: SearcherOptions::default(),
        }
    }

    /// Serves resources from `offline_store` when it holds them.
    pub fn offline(mut self, offline_store: Arc<dyn OfflineStore>) -> Self {
        self.offline_store = Some(offline_store);
        self
    }

    pub fn layout(mut self, layout: CorpusLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Capacity of the query term hash memo; zero disables it.
    pub fn hash_memo_capacity(mut self, capacity: usize) -> Self {
        self.searcher.hash_memo_capacity = capacity;
        self
    }

    pub fn tokenizer(mut self, tokenizer: TokenizerKind) -> Self {
        self.searcher.tokenizer = tokenizer;
        self
    }

    /// Opens the corpus. No resource is read until the first lookup.
    ///
    /// # Errors
    ///
    /// Invalid argument if a layout resource name is not a clean relative name.
    pub fn open(self) -> Result<Corpus> {
        self.layout.validate()?;
        let loader = Arc::new(match self.offline_store {
            Some(offline) => ResourceLoader::with_offline(self.object_store, offline),
            None => ResourceLoader::new(self.object_store),
        });
        let access: Arc<dyn ResourceAccess> = loader.clone();
        let searcher = Searcher::with_options(
            access,
            self.layout.primary_category(),
            &self.searcher,
        )?;
        let mut categories = vec![self.layout.primary_category()];
        categories.extend(self.layout.categories.iter().map(Category::from));
        log::debug!(
            "opened corpus with {} search categories, tokenizer {}",
            categories.len(),
            self.searcher.tokenizer.name()
        );
        Ok(Corpus(Arc::new(CorpusContext {
            loader,
            layout: self.layout,
            searcher,
            categories,
        })))
    }
}
