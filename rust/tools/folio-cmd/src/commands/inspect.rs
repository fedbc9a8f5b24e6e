//! Inspect command implementation

use anyhow::Result;
use folio::{
    Corpus,
    common::Result as FolioResult,
    format::{
        Header,
        annotations::AnnotationsFile,
        books::{BooksFile, BooksHeader, BooksIndex},
        chapters::ChaptersIndex,
        pages::PagesIndex,
        postings::PostingsHeader,
        titles::TitlesFile,
        words::{WordDict, WordsIndex},
    },
};
use serde::Serialize;

use crate::commands::{open_corpus, print_json};

#[derive(Debug, Serialize)]
pub struct InspectSummary {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub counts: Vec<(&'static str, u64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Books,
    BooksIndex,
    PagesIndex,
    ChaptersIndex,
    Titles,
    WordDict,
    WordsIndex,
    Postings,
    Annotations,
}

impl FileKind {
    fn name(self) -> &'static str {
        match self {
            FileKind::Books => "books",
            FileKind::BooksIndex => "books_index",
            FileKind::PagesIndex => "pages_index",
            FileKind::ChaptersIndex => "chapters_index",
            FileKind::Titles => "titles",
            FileKind::WordDict => "word_dictionary",
            FileKind::WordsIndex => "words_index",
            FileKind::Postings => "postings",
            FileKind::Annotations => "annotations",
        }
    }
}

struct Details {
    counts: Vec<(&'static str, u64)>,
    compressed: Option<bool>,
}

impl Details {
    fn counts(counts: Vec<(&'static str, u64)>) -> Details {
        Details {
            counts,
            compressed: None,
        }
    }
}

pub fn run(dir: &str) -> Result<()> {
    let corpus = open_corpus(dir, "whitespace", None)?;
    print_json(&inspect(&corpus))
}

/// Describes every corpus file; a file that fails to load or decode carries its
/// error instead of its counts.
pub fn inspect(corpus: &Corpus) -> InspectSummary {
    let layout = corpus.layout();
    let mut files = vec![
        (layout.books.clone(), FileKind::Books),
        (layout.books_index.clone(), FileKind::BooksIndex),
        (layout.pages_index.clone(), FileKind::PagesIndex),
        (layout.chapters_index.clone(), FileKind::ChaptersIndex),
        (layout.titles.clone(), FileKind::Titles),
        (layout.words.clone(), FileKind::WordDict),
    ];
    if let Some(words_index) = &layout.words_index {
        files.push((words_index.clone(), FileKind::WordsIndex));
    }
    files.push((layout.postings.clone(), FileKind::Postings));
    files.push((layout.annotations.clone(), FileKind::Annotations));
    for category in &layout.categories {
        files.push((category.dict.clone(), FileKind::WordDict));
        files.push((category.postings.clone(), FileKind::Postings));
    }

    let files = files
        .into_iter()
        .map(|(name, kind)| inspect_file(corpus, name, kind))
        .collect();
    InspectSummary { files }
}

fn inspect_file(corpus: &Corpus, name: String, kind: FileKind) -> FileInfo {
    let mut info = FileInfo {
        name,
        kind: kind.name(),
        size: None,
        counts: Vec::new(),
        compressed: None,
        error: None,
    };
    let buf = match corpus.loader().load_whole(&info.name) {
        Ok(buf) => buf,
        Err(e) => {
            log::warn!("cannot load '{}': {e}", info.name);
            info.error = Some(e.to_string());
            return info;
        }
    };
    info.size = Some(buf.len() as u64);
    match describe(&buf, kind) {
        Ok(details) => {
            info.counts = details.counts;
            info.compressed = details.compressed;
        }
        Err(e) => info.error = Some(e.to_string()),
    }
    info
}

fn describe(buf: &[u8], kind: FileKind) -> FolioResult<Details> {
    let details = match kind {
        FileKind::Books => {
            let header = BooksHeader::parse(buf)?;
            let mut details = Details::counts(vec![("blocks", header.block_count)]);
            details.compressed = Some(header.compression != 0);
            if header.compression == 0 {
                BooksFile::open(buf)?;
            }
            details
        }
        FileKind::BooksIndex => Details::counts(vec![("books", BooksIndex::open(buf)?.len() as u64)]),
        FileKind::PagesIndex => {
            let pages = PagesIndex::open(buf)?;
            Details::counts(vec![
                ("pages", pages.len() as u64),
                ("sorted", pages.is_sorted() as u64),
            ])
        }
        FileKind::ChaptersIndex => {
            Details::counts(vec![("chapters", ChaptersIndex::open(buf)?.len() as u64)])
        }
        FileKind::Titles => Details::counts(vec![("titles", TitlesFile::open(buf)?.len() as u64)]),
        FileKind::WordDict => Details::counts(vec![("words", WordDict::open(buf)?.len() as u64)]),
        FileKind::WordsIndex => {
            Details::counts(vec![("words", WordsIndex::open(buf)?.len() as u64)])
        }
        FileKind::Postings => {
            let header = PostingsHeader::parse(buf)?;
            Details {
                counts: vec![
                    ("postings", header.total_postings),
                    ("blocks", header.block_count),
                ],
                compressed: Some(header.is_compressed()),
            }
        }
        FileKind::Annotations => {
            let anno = AnnotationsFile::open(buf)?;
            Details::counts(vec![
                ("comments", anno.comments().len() as u64),
                ("formatting", anno.formatting().len() as u64),
                ("highlights", anno.highlights().len() as u64),
            ])
        }
    };
    Ok(details)
}

#[cfg(test)]
mod tests {
    use folio_testkit::sample_corpus;

    use super::*;

    fn count(info: &FileInfo, key: &str) -> Option<u64> {
        info.counts.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    #[test]
    fn test_inspect_sample() {
        let dir = sample_corpus().build().to_temp_dir().unwrap();
        let corpus = open_corpus(dir.path().to_str().unwrap(), "whitespace", None).unwrap();
        let summary = inspect(&corpus);
        assert_eq!(summary.files.len(), 8);
        assert!(summary.files.iter().all(|f| f.error.is_none()));

        let pages = summary.files.iter().find(|f| f.kind == "pages_index").unwrap();
        assert_eq!(count(pages, "pages"), Some(4));
        let books = summary.files.iter().find(|f| f.kind == "books_index").unwrap();
        assert_eq!(count(books, "books"), Some(2));
        let anno = summary.files.iter().find(|f| f.kind == "annotations").unwrap();
        assert_eq!(count(anno, "comments"), Some(2));
    }

    #[test]
    fn test_inspect_reports_file_errors() {
        let mut files = sample_corpus().compress_postings(true).build();
        files.remove("titles.bin");
        let dir = files.to_temp_dir().unwrap();
        let corpus = open_corpus(dir.path().to_str().unwrap(), "whitespace", None).unwrap();
        let summary = inspect(&corpus);

        let titles = summary.files.iter().find(|f| f.kind == "titles").unwrap();
        assert!(titles.error.is_some());
        assert!(titles.size.is_none());
        let postings = summary.files.iter().find(|f| f.kind == "postings").unwrap();
        assert_eq!(postings.compressed, Some(true));
        assert!(postings.error.is_none());
    }
}
