//! Search command implementation

use anyhow::Result;
use folio::{Corpus, PageSnippet, text_index::ResultPage};
use serde::Serialize;

use crate::commands::{open_corpus, print_json};

pub struct SearchArgs {
    pub ranked: bool,
    pub categories: bool,
    pub offset: usize,
    pub limit: usize,
    pub snippets: bool,
    pub tokenizer: String,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub mode: &'static str,
    pub hits: Vec<Hit>,
}

#[derive(Debug, Serialize)]
pub struct Hit {
    pub page_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PageSnippet>,
}

impl Hit {
    fn page(page_id: u32) -> Hit {
        Hit {
            page_id,
            score: None,
            category: None,
            snippet: None,
        }
    }
}

pub fn run(dir: &str, query: &str, args: SearchArgs) -> Result<()> {
    let corpus = open_corpus(dir, &args.tokenizer, None)?;
    let output = search(&corpus, query, &args)?;
    log::info!("{} hits for '{query}'", output.hits.len());
    print_json(&output)
}

pub fn search(corpus: &Corpus, query: &str, args: &SearchArgs) -> Result<SearchOutput> {
    let window = ResultPage::new(args.offset, args.limit);
    let (mode, mut hits) = if args.ranked {
        let hits: Vec<Hit> = corpus
            .ranked_search(query, window)?
            .into_iter()
            .map(|hit| Hit {
                score: Some(hit.score),
                ..Hit::page(hit.page_id)
            })
            .collect();
        ("ranked", hits)
    } else if args.categories {
        let categories = corpus.categories();
        let hits: Vec<Hit> = corpus
            .search_categories(query)?
            .into_iter()
            .map(|(page_id, index)| Hit {
                category: Some(categories[index].name.clone()),
                ..Hit::page(page_id)
            })
            .collect();
        ("categories", window.apply(hits))
    } else {
        let hits: Vec<Hit> = corpus.search(query)?.into_iter().map(Hit::page).collect();
        ("phrase", window.apply(hits))
    };

    if args.snippets {
        for hit in &mut hits {
            hit.snippet = corpus.snippet(hit.page_id, query)?;
        }
    }
    Ok(SearchOutput {
        query: query.to_string(),
        mode,
        hits,
    })
}

#[cfg(test)]
mod tests {
    use folio_testkit::sample_corpus;

    use super::*;

    fn args() -> SearchArgs {
        SearchArgs {
            ranked: false,
            categories: false,
            offset: 0,
            limit: 0,
            snippets: false,
            tokenizer: "whitespace".to_string(),
        }
    }

    fn pages(output: &SearchOutput) -> Vec<u32> {
        output.hits.iter().map(|h| h.page_id).collect()
    }

    #[test]
    fn test_search_modes() {
        let dir = sample_corpus().build().to_temp_dir().unwrap();
        let dir = dir.path().to_str().unwrap();
        let corpus = open_corpus(dir, "whitespace", None).unwrap();

        let output = search(&corpus, "the cat", &args()).unwrap();
        assert_eq!(output.mode, "phrase");
        assert_eq!(pages(&output), vec![1, 3]);
        assert!(output.hits[0].score.is_none());

        let ranked = SearchArgs {
            ranked: true,
            limit: 1,
            ..args()
        };
        let output = search(&corpus, "the cat", &ranked).unwrap();
        assert_eq!(pages(&output), vec![1]);
        assert_eq!(output.hits[0].score, Some(9.0));

        let categories = SearchArgs {
            categories: true,
            offset: 1,
            ..args()
        };
        let output = search(&corpus, "the cat", &categories).unwrap();
        assert_eq!(pages(&output), vec![3]);
        assert_eq!(output.hits[0].category.as_deref(), Some("primary"));
    }

    #[test]
    fn test_snippets_in_json() {
        let dir = sample_corpus().build().to_temp_dir().unwrap();
        let corpus = open_corpus(dir.path().to_str().unwrap(), "whitespace", None).unwrap();
        let with_snippets = SearchArgs {
            snippets: true,
            ..args()
        };
        let output = search(&corpus, "sat on", &with_snippets).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["hits"][0]["page_id"], 1);
        assert_eq!(json["hits"][0]["snippet"]["before"], "the cat ");
        assert_eq!(json["hits"][0]["snippet"]["after"], " the mat");
        assert!(json["hits"][0].get("score").is_none());
    }

    #[test]
    fn test_bad_arguments() {
        assert!(open_corpus("/nonexistent/folio", "whitespace", None).is_err());
        let dir = sample_corpus().build().to_temp_dir().unwrap();
        assert!(open_corpus(dir.path().to_str().unwrap(), "klingon", None).is_err());
    }
}
