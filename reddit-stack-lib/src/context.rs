use crate::marker::MarkerPattern;
use crate::reference::{ReferenceError, StopWords, Taxonomy};
use std::path::Path;

/// Everything a run needs besides the comments themselves. Built once at
/// startup and passed by reference to each stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub marker: MarkerPattern,
    pub stop_words: StopWords,
    pub taxonomy: Option<Taxonomy>,
}

impl RunContext {
    pub fn new(stop_words: StopWords) -> Self {
        Self {
            marker: MarkerPattern::default(),
            stop_words,
            taxonomy: None,
        }
    }

    /// Load the reference files. The taxonomy is optional, the stop words
    /// are not.
    pub fn load(stop_words: &Path, taxonomy: Option<&Path>) -> Result<Self, ReferenceError> {
        let stop_words = StopWords::load(stop_words)?;
        let taxonomy = taxonomy.map(Taxonomy::load).transpose()?;

        Ok(Self {
            marker: MarkerPattern::default(),
            stop_words,
            taxonomy,
        })
    }

    pub fn with_marker(mut self, marker: MarkerPattern) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }
}
