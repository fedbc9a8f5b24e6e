//! Command implementations for folio-cmd

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use folio::{
    Corpus, CorpusLayout, CorpusOptions,
    objectstore::{local_store::LocalFsObjectStore, offline::DirOfflineStore},
    text_index::TokenizerKind,
};
use serde::Serialize;

pub mod inspect;
pub mod offline;
pub mod page;
pub mod search;
pub mod styles;

/// Opens the corpus stored in `dir`, honoring its layout file when present.
pub fn open_corpus(dir: &str, tokenizer: &str, offline_dir: Option<&str>) -> Result<Corpus> {
    let path = Path::new(dir);
    if !path.is_dir() {
        anyhow::bail!("Corpus directory does not exist: {dir}");
    }
    let layout = CorpusLayout::discover(path)
        .with_context(|| format!("Failed to read the layout of {dir}"))?;
    let store = LocalFsObjectStore::new(path)
        .with_context(|| format!("Failed to open corpus directory {dir}"))?;
    let tokenizer = TokenizerKind::try_from(tokenizer)?;

    let mut options = CorpusOptions::new(Arc::new(store))
        .layout(layout)
        .tokenizer(tokenizer);
    if let Some(offline_dir) = offline_dir {
        let offline = DirOfflineStore::new(Path::new(offline_dir))
            .with_context(|| format!("Failed to open offline store {offline_dir}"))?;
        options = options.offline(Arc::new(offline));
    }
    Ok(options.open()?)
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
