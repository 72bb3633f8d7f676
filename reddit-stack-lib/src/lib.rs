//! Extract tech-stack mentions from a Reddit questionnaire thread.
//!
//! The pipeline runs strictly forward:
//! - [`normalize_comments`] splits raw bodies into flat lines or marker blocks
//! - [`extract_stack_lines`] keeps the lines that answer the tech-stack question
//! - [`tokenize_and_clean`] turns those lines into candidate technology names
//! - [`count`] tallies the names for reporting
//!
//! Fetching the comments is handled by [`RedditClient`].

mod clean;
mod context;
mod count;
mod extract;
mod marker;
mod normalize;
mod reddit;
mod reference;

pub use clean::{clean_token, tokenize, tokenize_and_clean, NOISE_CHARS};
pub use context::RunContext;
pub use count::{categorize, count, CategoryTally, TokenCount, TokenCounts, UNCATEGORIZED};
pub use extract::extract_stack_lines;
pub use marker::{is_marker_line, MarkerPattern, DEFAULT_QUESTION};
pub use normalize::{normalize_comment, normalize_comments, MarkerBlock, NormalizedComment};
pub use reddit::{
    parse_thread_id, CredentialError, Credentials, MoreStub, RawComment, RedditClient,
    DEFAULT_USER_AGENT,
};
pub use reference::{ReferenceError, StopWords, Taxonomy};

use serde::Serialize;
use tracing::debug;

/// Result of running the extraction pipeline over a set of comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackExtraction {
    /// Marker and block lines, in extraction order.
    pub lines: Vec<String>,
    /// Clean tokens, in order, duplicates included.
    pub tokens: Vec<String>,
}

/// Run normalize, extract and clean over the given comment bodies.
///
/// # Example
/// ```
/// use reddit_stack_lib::{extract_tech_stack, RunContext, StopWords};
/// let ctx = RunContext::new(StopWords::from_words(["tech", "stack"]));
/// let bodies = ["1. Role\nEngineer\n\n7) Tech stack:\nGolang\nTerraform, AWS S3"];
/// let result = extract_tech_stack(&ctx, bodies);
/// assert_eq!(result.tokens, vec!["golang", "terraform", "aws", "s3"]);
/// ```
pub fn extract_tech_stack<'a, I>(ctx: &RunContext, bodies: I) -> StackExtraction
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized = normalize_comments(ctx, bodies);
    let lines = extract_stack_lines(ctx, &normalized);
    let tokens = tokenize_and_clean(ctx, &lines);

    debug!(
        "Extracted {} tokens from {} stack lines in {} comments",
        tokens.len(),
        lines.len(),
        normalized.len()
    );

    StackExtraction {
        lines: lines.into_iter().map(str::to_string).collect(),
        tokens,
    }
}

/// [`extract_tech_stack`] over fetched comments.
pub fn extract_from_comments(ctx: &RunContext, comments: &[RawComment]) -> StackExtraction {
    extract_tech_stack(ctx, comments.iter().map(|c| c.body.as_str()))
}
