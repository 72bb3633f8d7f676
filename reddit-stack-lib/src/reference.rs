//! Static reference data loaded once per run: the non-technology stop words
//! and the optional technology taxonomy.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading reference data. All of them are fatal for a
/// run: without a complete stop-word list the output is flooded with
/// ordinary words.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read reference file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Reference file {} contains no entries", path.display())]
    Empty { path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct StopWordsFile {
    words: Vec<String>,
}

/// Lowercased set of common non-technology words.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Load `{ "words": [...] }` from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let content = read_reference(path)?;
        Self::from_json(&content, path)
    }

    /// Parse `{ "words": [...] }`. `origin` only labels errors.
    pub fn from_json(content: &str, origin: &Path) -> Result<Self, ReferenceError> {
        let file: StopWordsFile =
            serde_json::from_str(content).map_err(|source| ReferenceError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        let stop_words = Self::from_words(file.words);
        if stop_words.is_empty() {
            return Err(ReferenceError::Empty {
                path: origin.to_path_buf(),
            });
        }
        Ok(stop_words)
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        // Callers normally pass lowercased tokens already
        word.chars().any(char::is_uppercase) && self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Category name to recognised technology names, e.g.
/// `{ "Orchestration": ["airflow", "dagster"] }`. Categories keep the order
/// they have in the file.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    categories: Vec<(String, Vec<String>)>,
    index: HashMap<String, String>,
}

impl Taxonomy {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let content = read_reference(path)?;
        Self::from_json(&content, path)
    }

    pub fn from_json(content: &str, origin: &Path) -> Result<Self, ReferenceError> {
        let parse_error = |source: serde_json::Error| ReferenceError::Parse {
            path: origin.to_path_buf(),
            source,
        };
        // serde_json's preserve_order keeps the object in file order
        let object: Map<String, Value> = serde_json::from_str(content).map_err(parse_error)?;
        let categories = object
            .into_iter()
            .map(|(category, names)| {
                serde_json::from_value::<Vec<String>>(names).map(|names| (category, names))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(parse_error)?;

        let taxonomy = Self::from_categories(categories);
        if taxonomy.index.is_empty() {
            return Err(ReferenceError::Empty {
                path: origin.to_path_buf(),
            });
        }
        Ok(taxonomy)
    }

    pub fn from_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut index = HashMap::new();
        let categories: Vec<(String, Vec<String>)> = categories
            .into_iter()
            .map(|(category, names)| {
                let names: Vec<String> = names
                    .iter()
                    .map(|n| n.trim().to_lowercase())
                    .filter(|n| !n.is_empty())
                    .collect();
                for name in &names {
                    // Earliest category in the file wins when a name is listed twice
                    index
                        .entry(name.clone())
                        .or_insert_with(|| category.clone());
                }
                (category, names)
            })
            .collect();

        Self { categories, index }
    }

    /// Category of a (lowercased) token, if the taxonomy knows it.
    pub fn category_of(&self, token: &str) -> Option<&str> {
        self.index.get(token).map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(category, _)| category.as_str())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn read_reference(path: &Path) -> Result<String, ReferenceError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ReferenceError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}
