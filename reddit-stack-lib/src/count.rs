//! Frequency tally over clean tokens, plus an optional grouping by taxonomy
//! category.

use crate::reference::Taxonomy;
use serde::Serialize;
use std::collections::HashMap;

/// Bucket for tokens the taxonomy does not recognise.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    pub token: String,
    pub count: usize,
}

/// Multiset of tokens. Remembers first-seen order so that display order is
/// deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct TokenCounts {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl TokenCounts {
    pub fn get(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of tokens counted, duplicates included.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Distinct tokens with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(|token| (token.as_str(), self.get(token)))
    }

    /// Highest count first; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<TokenCount> {
        let mut ranked: Vec<TokenCount> = self
            .iter()
            .map(|(token, count)| TokenCount {
                token: token.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

/// Tally `tokens`.
pub fn count<S: AsRef<str>>(tokens: &[S]) -> TokenCounts {
    let mut counts = TokenCounts::default();
    for token in tokens {
        let token = token.as_ref();
        match counts.counts.get_mut(token) {
            Some(n) => *n += 1,
            None => {
                counts.counts.insert(token.to_string(), 1);
                counts.order.push(token.to_string());
            }
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub category: String,
    pub total: usize,
    pub tokens: Vec<TokenCount>,
}

/// Group ranked counts by taxonomy category, in taxonomy order, with
/// unrecognised tokens last under [`UNCATEGORIZED`]. Empty categories are
/// left out.
pub fn categorize(counts: &TokenCounts, taxonomy: &Taxonomy) -> Vec<CategoryTally> {
    let mut grouped: HashMap<&str, Vec<TokenCount>> = HashMap::new();
    for entry in counts.ranked() {
        let category = taxonomy
            .category_of(&entry.token)
            .unwrap_or(UNCATEGORIZED);
        grouped.entry(category).or_default().push(entry);
    }

    taxonomy
        .categories()
        .chain(std::iter::once(UNCATEGORIZED))
        .filter_map(|category| {
            let tokens = grouped.remove(category)?;
            Some(CategoryTally {
                category: category.to_string(),
                total: tokens.iter().map(|t| t.count).sum(),
                tokens,
            })
        })
        .collect()
}
