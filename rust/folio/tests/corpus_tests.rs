use std::sync::Arc;

use folio::{CategoryLayout, Corpus, CorpusLayout, CorpusOptions};
use folio_objectstore::{
    ObjectStore, local_store::LocalFsObjectStore, null_store::NullObjectStore,
    offline::MemoryOfflineStore,
};
use folio_testkit::{CorpusFiles, sample_corpus};
use folio_text_index::{ResultPage, TokenizerKind};

fn open(files: &CorpusFiles) -> Corpus {
    CorpusOptions::new(Arc::new(files.to_memory_store()))
        .open()
        .unwrap()
}

#[test]
fn test_pages_and_text() {
    let corpus = open(&sample_corpus().build());
    assert_eq!(corpus.page_count().unwrap(), 4);

    let page = corpus.page(2).unwrap().unwrap();
    assert_eq!(page.book_id, 1);
    assert_eq!(page.chapter_id, 1);
    assert_eq!(page.page_number, 2);
    assert!(corpus.page(99).unwrap().is_none());

    assert_eq!(
        corpus.page_text(4).unwrap().as_deref(),
        Some("قال الله تعالى")
    );
    for page_id in 1..=4 {
        assert_eq!(
            corpus.page_text_ranged(page_id).unwrap(),
            corpus.page_text(page_id).unwrap(),
            "page {page_id}"
        );
    }
    assert!(corpus.page_text(99).unwrap().is_none());
    assert!(corpus.page_text_ranged(99).unwrap().is_none());
}

#[test]
fn test_ranged_text_reads_no_whole_container() {
    let corpus = open(&sample_corpus().build());
    assert_eq!(
        corpus.page_text_ranged(3).unwrap().as_deref(),
        Some("the dog chased the cat")
    );
    // Only the pages index was loaded whole.
    assert_eq!(corpus.loader().cached_count(), 1);
}

#[test]
fn test_compressed_books_rejected() {
    let corpus = open(&sample_corpus().compress_books(true).build());
    assert!(corpus.page_text(1).unwrap_err().is_unsupported());
    assert!(corpus.page_text_ranged(1).unwrap_err().is_unsupported());
    assert!(corpus.page_text(99).unwrap().is_none());
}

#[test]
fn test_page_text_past_text_region() {
    let mut files = sample_corpus().build();
    let mut pages = files.get("pages.idx").unwrap().to_vec();
    // Length field of the fourth (last) page entry.
    let at = 24 + 3 * 32 + 28;
    let length = u32::from_le_bytes(pages[at..at + 4].try_into().unwrap());
    pages[at..at + 4].copy_from_slice(&(length + 30).to_le_bytes());
    files.insert("pages.idx", pages);

    let corpus = open(&files);
    assert!(corpus.page_text(4).unwrap_err().is_format());
    assert!(corpus.page_text_ranged(4).unwrap_err().is_format());
    assert_eq!(
        corpus.page_text_ranged(3).unwrap().as_deref(),
        Some("the dog chased the cat")
    );
}

#[test]
fn test_books_chapters_titles() {
    let corpus = open(&sample_corpus().build());
    let book = corpus.book(1).unwrap().unwrap();
    assert_eq!(book.page_ids(), 1..4);
    assert_eq!(corpus.books().unwrap().len(), 2);
    assert!(corpus.book(7).unwrap().is_none());

    assert_eq!(corpus.book_title(2).unwrap().as_deref(), Some("كتاب"));
    assert_eq!(corpus.chapter_title(2).unwrap().as_deref(), Some("Dogs"));
    assert_eq!(corpus.chapter(3).unwrap().unwrap().book_id, 2);
    assert_eq!(corpus.chapters_of(1).unwrap().len(), 2);
    assert_eq!(corpus.title(0).unwrap().as_deref(), Some("Animals"));
    assert!(corpus.title(99).unwrap().is_none());
}

#[test]
fn test_search() {
    let corpus = open(&sample_corpus().build());
    assert_eq!(corpus.search("the cat").unwrap(), vec![1, 3]);
    assert!(corpus.search("").unwrap().is_empty());

    let hits = corpus
        .ranked_search("the cat", ResultPage::new(0, 2))
        .unwrap();
    let pages: Vec<u32> = hits.iter().map(|h| h.page_id).collect();
    assert_eq!(pages, vec![1, 3]);

    let snippet = corpus.snippet(3, "chased").unwrap().unwrap();
    assert_eq!(snippet.before, "the dog ");
    assert_eq!(snippet.matched, "chased");
    assert_eq!(snippet.after, " the cat");
    assert!(corpus.snippet(3, "the mat").unwrap().is_none());
}

#[test]
fn test_search_categories() {
    let mut builder = sample_corpus();
    builder.add_category("extra/words.idx", "extra/postings.bin", &[(7, "the cat")]);
    let files = builder.build();
    let layout = CorpusLayout {
        categories: vec![CategoryLayout {
            name: "extra".into(),
            dict: "extra/words.idx".into(),
            postings: "extra/postings.bin".into(),
        }],
        ..Default::default()
    };
    let corpus = CorpusOptions::new(Arc::new(files.to_memory_store()))
        .layout(layout)
        .open()
        .unwrap();
    assert_eq!(corpus.categories().len(), 2);
    assert_eq!(
        corpus.search_categories("the cat").unwrap(),
        vec![(1, 0), (3, 0), (7, 1)]
    );
}

#[test]
fn test_styles_and_comments() {
    let corpus = open(&sample_corpus().build());
    let runs = corpus.page_styles(1, 10).unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[1].range, 4..6);
    assert_eq!(runs[1].style.color_id, 3);

    let comments = corpus.comments(1).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].anchor_start, 1);
    assert_eq!(corpus.comment_text(&comments[0]).unwrap(), "a cat");

    let comments = corpus.comments(3).unwrap();
    assert_eq!(corpus.comment_text(&comments[0]).unwrap(), "تعليق");
    assert!(corpus.comments(2).unwrap().is_empty());
}

#[test]
fn test_clear_cache() {
    let corpus = open(&sample_corpus().build());
    corpus.search("the cat").unwrap();
    corpus.page_text(1).unwrap();
    assert!(corpus.loader().cached_count() >= 3);
    assert_eq!(corpus.searcher().cached_lists(), 2);

    corpus.clear_cache();
    assert_eq!(corpus.loader().cached_count(), 0);
    assert_eq!(corpus.searcher().cached_lists(), 0);
    assert_eq!(corpus.search("the cat").unwrap(), vec![1, 3]);
}

#[test]
fn test_offline_download() {
    let files = sample_corpus().build();
    let offline = Arc::new(MemoryOfflineStore::new());

    let online = CorpusOptions::new(Arc::new(files.to_memory_store()))
        .offline(offline.clone())
        .open()
        .unwrap();
    assert!(online.offline_info().unwrap().iter().all(|i| i.size.is_none()));
    let infos = online.download().unwrap();
    assert_eq!(infos.len(), 8);
    assert!(infos.iter().all(|i| i.size.is_some()));

    let store: Arc<dyn ObjectStore> = Arc::new(NullObjectStore);
    let offline_only = CorpusOptions::new(store.clone())
        .offline(offline)
        .open()
        .unwrap();
    assert_eq!(offline_only.search("the cat").unwrap(), vec![1, 3]);
    assert_eq!(
        offline_only.page_text_ranged(2).unwrap().as_deref(),
        Some("a cat and the dog")
    );

    let live_only = CorpusOptions::new(store).open().unwrap();
    assert!(live_only.search("the cat").unwrap_err().is_resource());
    assert!(live_only.download().is_err());
}

#[test]
fn test_local_directory() {
    let files = sample_corpus().build();
    let dir = files.to_temp_dir().unwrap();
    std::fs::write(
        dir.path().join(folio::layout::LAYOUT_FILE),
        r#"{ "annotations": "annotations.bin" }"#,
    )
    .unwrap();

    let layout = CorpusLayout::discover(dir.path()).unwrap();
    let store = LocalFsObjectStore::new(dir.path()).unwrap();
    let corpus = CorpusOptions::new(Arc::new(store))
        .layout(layout)
        .tokenizer(TokenizerKind::Arabic)
        .hash_memo_capacity(0)
        .open()
        .unwrap();
    assert_eq!(corpus.search("قَالَ الله").unwrap(), vec![4]);
    assert!(corpus.searcher().hash_memo().is_empty());
    assert_eq!(
        corpus.page_text(1).unwrap().as_deref(),
        Some("the cat sat on the mat")
    );
}

#[test]
fn test_invalid_layout() {
    let layout = CorpusLayout {
        books: "../books.bin".into(),
        ..Default::default()
    };
    let result = CorpusOptions::new(Arc::new(NullObjectStore))
        .layout(layout)
        .open();
    assert!(result.is_err());
}
