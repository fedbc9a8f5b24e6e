//! Offline command implementation

use anyhow::Result;
use folio::Corpus;
use serde::Serialize;

use crate::commands::{open_corpus, print_json};

#[derive(Debug, Serialize)]
pub struct OfflineEntry {
    pub name: String,
    pub stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

pub fn run(dir: &str, offline_dir: &str, download: bool) -> Result<()> {
    let corpus = open_corpus(dir, "whitespace", Some(offline_dir))?;
    print_json(&offline(&corpus, download)?)
}

/// Lists the offline presence of every corpus file, downloading them first when
/// `download` is set.
pub fn offline(corpus: &Corpus, download: bool) -> Result<Vec<OfflineEntry>> {
    let infos = if download {
        log::info!("downloading {} files", corpus.layout().resources().len());
        corpus.download()?
    } else {
        corpus.offline_info()?
    };
    Ok(infos
        .into_iter()
        .map(|info| OfflineEntry {
            stored: info.size.is_some(),
            name: info.name,
            size: info.size,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use folio_testkit::sample_corpus;

    use super::*;

    #[test]
    fn test_offline_download() {
        let dir = sample_corpus().build().to_temp_dir().unwrap();
        let offline_dir = tempfile::tempdir().unwrap();
        let dir = dir.path().to_str().unwrap();
        let offline_path = offline_dir.path().to_str().unwrap();

        let corpus = open_corpus(dir, "whitespace", Some(offline_path)).unwrap();
        let before = offline(&corpus, false).unwrap();
        assert!(before.iter().all(|e| !e.stored));

        let after = offline(&corpus, true).unwrap();
        assert_eq!(after.len(), 8);
        assert!(after.iter().all(|e| e.stored && e.size.is_some()));

        let reopened = open_corpus(dir, "whitespace", Some(offline_path)).unwrap();
        assert!(offline(&reopened, false).unwrap().iter().all(|e| e.stored));
        assert!(offline_dir.path().join("postings.bin").is_file());
    }
}
