//! Styles command implementation

use anyhow::Result;
use folio::{Corpus, styles::StyleRun};
use serde::Serialize;

use crate::commands::{open_corpus, print_json};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RunOutput {
    pub start: u32,
    pub end: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub small_caps: bool,
    pub color_id: u16,
    pub category_id: u16,
}

impl From<&StyleRun> for RunOutput {
    fn from(run: &StyleRun) -> Self {
        RunOutput {
            start: run.range.start,
            end: run.range.end,
            bold: run.style.bold(),
            italic: run.style.italic(),
            underline: run.style.underline(),
            small_caps: run.style.small_caps(),
            color_id: run.style.color_id,
            category_id: run.style.category_id,
        }
    }
}

pub fn run(dir: &str, page_id: u32, tokens: u32) -> Result<()> {
    let corpus = open_corpus(dir, "whitespace", None)?;
    print_json(&styles(&corpus, page_id, tokens)?)
}

pub fn styles(corpus: &Corpus, page_id: u32, tokens: u32) -> Result<Vec<RunOutput>> {
    Ok(corpus
        .page_styles(page_id, tokens)?
        .iter()
        .map(RunOutput::from)
        .collect())
}
