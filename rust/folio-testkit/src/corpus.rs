//! Whole-corpus builder.
//!
//! Pages are numbered from 1 in insertion order and their texts are concatenated
//! into the books container, so a page may straddle block boundaries. The primary
//! text index covers every page; extra categories index their own page texts.

use std::path::Path;

use anyhow::Context;
use folio_objectstore::memory_store::MemoryObjectStore;

use crate::writers::{
    self, BookRow, ChapterRow, CommentRow, FormattingRow, HighlightRow, PageRow, TermIndex,
    WordRow,
};

pub const BOOKS_BIN: &str = "books.bin";
pub const BOOKS_IDX: &str = "books.idx";
pub const PAGES_IDX: &str = "pages.idx";
pub const CHAPTERS_IDX: &str = "chapters.idx";
pub const TITLES_BIN: &str = "titles.bin";
pub const WORDS_IDX: &str = "words.idx";
pub const POSTINGS_BIN: &str = "postings.bin";
pub const ANNOTATIONS_BIN: &str = "annotations.bin";

struct ExtraCategory {
    dict: String,
    postings: String,
    index: TermIndex,
}

pub struct CorpusBuilder {
    block_size: usize,
    compress_books: bool,
    compress_postings: bool,
    words_index: Option<String>,
    titles: Vec<String>,
    books: Vec<BookRow>,
    chapters: Vec<ChapterRow>,
    pages: Vec<(PageRow, String)>,
    comments: Vec<CommentRow>,
    formatting: Vec<FormattingRow>,
    highlights: Vec<HighlightRow>,
    categories: Vec<ExtraCategory>,
}

impl CorpusBuilder {
    pub fn new() -> CorpusBuilder {
        CorpusBuilder {
            block_size: 64,
            compress_books: false,
            compress_postings: false,
            words_index: None,
            titles: Vec::new(),
            books: Vec::new(),
            chapters: Vec::new(),
            pages: Vec::new(),
            comments: Vec::new(),
            formatting: Vec::new(),
            highlights: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Marks the books container as compressed.
    pub fn compress_books(mut self, compressed: bool) -> Self {
        self.compress_books = compressed;
        self
    }

    /// Sets the compression flag of every postings file.
    pub fn compress_postings(mut self, compressed: bool) -> Self {
        self.compress_postings = compressed;
        self
    }

    /// Also writes a words index metadata file under `name`.
    pub fn words_index(mut self, name: &str) -> Self {
        self.words_index = Some(name.to_string());
        self
    }

    fn add_title(&mut self, title: &str) -> u32 {
        self.titles.push(title.to_string());
        (self.titles.len() - 1) as u32
    }

    /// Adds a book and returns its id (1-based).
    pub fn add_book(&mut self, title: &str) -> u32 {
        let title_index = self.add_title(title);
        let book_id = self.books.len() as u32 + 1;
        self.books.push(BookRow {
            book_id,
            title_index,
            ..Default::default()
        });
        book_id
    }

    /// Adds a chapter to `book_id` and returns its id (1-based, corpus-wide).
    pub fn add_chapter(&mut self, book_id: u32, title: &str) -> u32 {
        let title_index = self.add_title(title);
        let chapter_id = self.chapters.len() as u32 + 1;
        let chapter_number = self
            .chapters
            .iter()
            .filter(|c| c.book_id == book_id)
            .count() as u32
            + 1;
        self.chapters.push(ChapterRow {
            chapter_id,
            book_id,
            chapter_number,
            title_index,
            ..Default::default()
        });
        chapter_id
    }

    /// Adds a page of `chapter_id` and returns its id (1-based, corpus-wide).
    pub fn add_page(&mut self, book_id: u32, chapter_id: u32, text: &str) -> u32 {
        let page_id = self.pages.len() as u32 + 1;
        let page_number = self
            .pages
            .iter()
            .filter(|(p, _)| p.book_id == book_id)
            .count() as u32
            + 1;
        self.pages.push((
            PageRow {
                page_id,
                book_id,
                chapter_id,
                page_number,
                ..Default::default()
            },
            text.to_string(),
        ));
        page_id
    }

    pub fn add_comment(&mut self, page_id: u32, anchor: (u32, u32), text: &str) {
        self.comments.push(CommentRow {
            page_id,
            anchor_start: anchor.0,
            anchor_end: anchor.1,
            text: text.to_string(),
            ..Default::default()
        });
    }

    pub fn add_formatting(
        &mut self,
        page_id: u32,
        anchor: (u32, u32),
        flags: u16,
        layer: u16,
        priority: u16,
    ) {
        self.formatting.push(FormattingRow {
            page_id,
            anchor_start: anchor.0,
            anchor_end: anchor.1,
            flags,
            layer,
            priority,
            ..Default::default()
        });
    }

    pub fn add_highlight(
        &mut self,
        page_id: u32,
        anchor: (u32, u32),
        color_id: u16,
        deleted: bool,
    ) {
        self.highlights.push(HighlightRow {
            page_id,
            anchor_start: anchor.0,
            anchor_end: anchor.1,
            color_id,
            deleted,
            ..Default::default()
        });
    }

    /// Adds a search category indexing `(page_id, text)` pairs into the `dict` and
    /// `postings` resources.
    pub fn add_category(&mut self, dict: &str, postings: &str, pages: &[(u32, &str)]) {
        let mut index = TermIndex::new();
        for &(page_id, text) in pages {
            index.add_page(page_id, text);
        }
        self.categories.push(ExtraCategory {
            dict: dict.to_string(),
            postings: postings.to_string(),
            index,
        });
    }

    pub fn build(mut self) -> CorpusFiles {
        let mut text = Vec::new();
        let mut index = TermIndex::new();
        for (row, page_text) in &mut self.pages {
            let start = text.len();
            row.block_id = (start / self.block_size) as u32;
            row.offset_in_block = (start % self.block_size) as u32;
            row.length = page_text.len() as u32;
            text.extend_from_slice(page_text.as_bytes());
            index.add_page(row.page_id, page_text);
        }

        for chapter in &mut self.chapters {
            let mut ids = self
                .pages
                .iter()
                .filter(|(p, _)| p.chapter_id == chapter.chapter_id)
                .map(|(p, _)| p.page_id);
            if let Some(first) = ids.next() {
                chapter.first_page_id = first;
                chapter.page_count = 1 + ids.count() as u32;
            }
        }
        for book in &mut self.books {
            let pages: Vec<&PageRow> = self
                .pages
                .iter()
                .map(|(p, _)| p)
                .filter(|p| p.book_id == book.book_id)
                .collect();
            if let (Some(first), Some(last)) = (pages.first(), pages.last()) {
                book.first_page_id = first.page_id;
                book.page_count = pages.len() as u32;
                let block_size = self.block_size as u64;
                let offset =
                    |p: &PageRow| p.block_id as u64 * block_size + p.offset_in_block as u64;
                book.text_start_offset = offset(first);
                book.text_end_offset = offset(last) + last.length as u64;
            }
            let mut chapters = self.chapters.iter().filter(|c| c.book_id == book.book_id);
            if let Some(first) = chapters.next() {
                book.first_chapter_id = first.chapter_id;
                book.chapter_count = 1 + chapters.count() as u32;
            }
        }

        let mut files = CorpusFiles::default();
        let compression = self.compress_books as u32;
        files.insert(BOOKS_BIN, writers::books_bin(&text, self.block_size, compression));
        files.insert(BOOKS_IDX, writers::books_idx(&self.books));
        let pages: Vec<PageRow> = self.pages.iter().map(|(p, _)| *p).collect();
        files.insert(PAGES_IDX, writers::pages_idx(&pages));
        files.insert(CHAPTERS_IDX, writers::chapters_idx(&self.chapters));
        let titles: Vec<&str> = self.titles.iter().map(String::as_str).collect();
        files.insert(TITLES_BIN, writers::titles_bin(&titles));

        let (dict, postings) = index.build(self.compress_postings);
        if let Some(name) = &self.words_index {
            let rows: Vec<WordRow> = (0..index.term_count() as u32)
                .map(|word_id| WordRow {
                    word_id,
                    ..Default::default()
                })
                .collect();
            files.insert(name, writers::words_index(&rows, postings.len() as u64));
        }
        files.insert(WORDS_IDX, dict);
        files.insert(POSTINGS_BIN, postings);
        for category in &self.categories {
            let (dict, postings) = category.index.build(self.compress_postings);
            files.insert(&category.dict, dict);
            files.insert(&category.postings, postings);
        }

        files.insert(
            ANNOTATIONS_BIN,
            writers::annotations_bin(&self.comments, &self.formatting, &self.highlights),
        );
        files
    }
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        CorpusBuilder::new()
    }
}

/// Named file images of a built corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusFiles {
    files: Vec<(String, Vec<u8>)>,
}

impl CorpusFiles {
    /// Adds or replaces a file.
    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.remove(name);
        self.files.push((name.to_string(), data));
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let pos = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(n, _)| n.as_str())
    }

    pub fn to_memory_store(&self) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        for (name, data) in &self.files {
            store.insert(name.clone(), data.clone());
        }
        store
    }

    /// Writes every file under `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> anyhow::Result<()> {
        for (name, data) in &self.files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            std::fs::write(&path, data).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    }

    /// Writes the corpus into a fresh temporary directory.
    pub fn to_temp_dir(&self) -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        self.write_to_dir(dir.path())?;
        Ok(dir)
    }
}

/// Two books of three pages: English text in the first book and Arabic in the
/// second, with formatting, highlights and comments on page 1.
pub fn sample_corpus() -> CorpusBuilder {
    let mut builder = CorpusBuilder::new().block_size(16);
    let book = builder.add_book("Animals");
    let chapter = builder.add_chapter(book, "Cats");
    builder.add_page(book, chapter, "the cat sat on the mat");
    builder.add_page(book, chapter, "a cat and the dog");
    let chapter = builder.add_chapter(book, "Dogs");
    builder.add_page(book, chapter, "the dog chased the cat");

    let book = builder.add_book("كتاب");
    let chapter = builder.add_chapter(book, "باب");
    builder.add_page(book, chapter, "قال الله تعالى");

    builder.add_formatting(1, (0, 10), 1, 0, 0);
    builder.add_highlight(1, (4, 6), 3, false);
    builder.add_highlight(1, (0, 2), 5, true);
    builder.add_comment(1, (1, 2), "a cat");
    builder.add_comment(3, (0, 1), "تعليق");
    builder
}
