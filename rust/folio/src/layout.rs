//! Resource names of a corpus, loadable from a JSON layout file.

use std::path::Path;

use folio_common::{Result, error::Error};
use folio_objectstore::verify_resource_name;
use folio_text_index::Category;
use serde::{Deserialize, Serialize};

/// Name of the optional layout file at the root of a corpus directory.
pub const LAYOUT_FILE: &str = "folio.json";

/// An extra searchable (dictionary, postings) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLayout {
    pub name: String,
    pub dict: String,
    pub postings: String,
}

impl From<&CategoryLayout> for Category {
    fn from(layout: &CategoryLayout) -> Self {
        Category::new(&layout.name, &layout.dict, &layout.postings)
    }
}

/// Resource name of every corpus file kind.
///
/// Missing fields take their default names, so `{}` is a valid layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusLayout {
    pub books: String,
    pub books_index: String,
    pub pages_index: String,
    pub chapters_index: String,
    pub titles: String,
    /// The word dictionary searched by hash.
    pub words: String,
    /// Word metadata table; not needed for search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_index: Option<String>,
    pub postings: String,
    pub annotations: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryLayout>,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        CorpusLayout {
            books: "books.bin".into(),
            books_index: "books.idx".into(),
            pages_index: "pages.idx".into(),
            chapters_index: "chapters.idx".into(),
            titles: "titles.bin".into(),
            words: "words.idx".into(),
            words_index: None,
            postings: "postings.bin".into(),
            annotations: "annotations.bin".into(),
            categories: Vec::new(),
        }
    }
}

impl CorpusLayout {
    /// Parses a layout from a JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<CorpusLayout> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::invalid_arg("layout", e.to_string()))?;
        if !value.is_object() {
            return Err(Error::invalid_arg("layout", "expected a JSON object"));
        }
        let layout: CorpusLayout = serde_json::from_value(value)
            .map_err(|e| Error::invalid_arg("layout", e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> Result<CorpusLayout> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        CorpusLayout::from_json(&json)
    }

    /// Reads `dir/folio.json` when present, otherwise returns the default layout.
    pub fn discover(dir: &Path) -> Result<CorpusLayout> {
        let path = dir.join(LAYOUT_FILE);
        if path.is_file() {
            log::debug!("layout from {}", path.display());
            CorpusLayout::from_file(&path)
        } else {
            Ok(CorpusLayout::default())
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::invalid_operation(format!("serialize layout: {e}")))
    }

    /// Checks that every resource name is a clean relative name.
    pub fn validate(&self) -> Result<()> {
        for name in self.resources() {
            verify_resource_name(name).map_err(|e| Error::invalid_arg("layout", e.to_string()))?;
        }
        Ok(())
    }

    /// The primary search category: the corpus word dictionary and postings.
    pub fn primary_category(&self) -> Category {
        Category::new("primary", &self.words, &self.postings)
    }

    /// Every resource name of the layout, primary files first, without duplicates.
    pub fn resources(&self) -> Vec<&str> {
        let mut names = vec![
            self.books.as_str(),
            self.books_index.as_str(),
            self.pages_index.as_str(),
            self.chapters_index.as_str(),
            self.titles.as_str(),
            self.words.as_str(),
        ];
        names.extend(self.words_index.as_deref());
        names.push(&self.postings);
        names.push(&self.annotations);
        for category in &self.categories {
            names.push(&category.dict);
            names.push(&category.postings);
        }
        let mut seen = std::collections::HashSet::new();
        names.retain(|name| seen.insert(*name));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = CorpusLayout::from_json("{}").unwrap();
        assert_eq!(layout, CorpusLayout::default());
        assert_eq!(layout.words, "words.idx");
        assert_eq!(layout.resources().len(), 8);
        assert_eq!(layout.primary_category().dict, "words.idx");
    }

    #[test]
    fn test_layout_json() {
        let json = r#"{
            "words_index": "words.bin",
            "categories": [
                { "name": "hadith", "dict": "hadith/words.idx", "postings": "hadith/postings.bin" },
                { "name": "again", "dict": "hadith/words.idx", "postings": "hadith/postings.bin" }
            ]
        }"#;
        let layout = CorpusLayout::from_json(json).unwrap();
        assert_eq!(layout.words_index.as_deref(), Some("words.bin"));
        assert_eq!(layout.categories.len(), 2);
        assert_eq!(layout.resources().len(), 11);

        let back = CorpusLayout::from_json(&layout.to_json().unwrap()).unwrap();
        assert_eq!(back, layout);
        assert!(!CorpusLayout::default().to_json().unwrap().contains("categories"));
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(CorpusLayout::from_json(r#"{ "books": "../books.bin" }"#).is_err());
        assert!(CorpusLayout::from_json(r#"{ "pages": "pages.idx" }"#).is_err());
        assert!(CorpusLayout::from_json("[]").is_err());
        assert!(CorpusLayout::from_json(r#"["books.bin"]"#).is_err());
        assert!(CorpusLayout::from_json("null").is_err());
        assert!(CorpusLayout::from_json("7").is_err());
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            CorpusLayout::discover(dir.path()).unwrap(),
            CorpusLayout::default()
        );
        std::fs::write(dir.path().join(LAYOUT_FILE), r#"{ "titles": "t.bin" }"#).unwrap();
        assert_eq!(CorpusLayout::discover(dir.path()).unwrap().titles, "t.bin");
    }
}
