//! Page command implementation

use anyhow::Result;
use folio::Corpus;
use serde::Serialize;

use crate::commands::{open_corpus, print_json};

#[derive(Debug, Serialize)]
pub struct PageOutput {
    pub page_id: u32,
    pub page_number: u32,
    pub book_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    pub chapter_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentOutput>,
}

#[derive(Debug, Serialize)]
pub struct CommentOutput {
    pub anchor_start: u32,
    pub anchor_end: u32,
    pub text: String,
}

pub fn run(dir: &str, page_id: u32) -> Result<()> {
    let corpus = open_corpus(dir, "whitespace", None)?;
    print_json(&page(&corpus, page_id)?)
}

pub fn page(corpus: &Corpus, page_id: u32) -> Result<PageOutput> {
    let Some(entry) = corpus.page(page_id)? else {
        anyhow::bail!("Page {page_id} not found");
    };
    let text = corpus.page_text(page_id)?.unwrap_or_default();
    let comments = corpus
        .comments(page_id)?
        .iter()
        .map(|c| {
            Ok(CommentOutput {
                anchor_start: c.anchor_start,
                anchor_end: c.anchor_end,
                text: corpus.comment_text(c)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PageOutput {
        page_id,
        page_number: entry.page_number,
        book_id: entry.book_id,
        book_title: corpus.book_title(entry.book_id)?,
        chapter_id: entry.chapter_id,
        chapter_title: corpus.chapter_title(entry.chapter_id)?,
        text,
        comments,
    })
}
