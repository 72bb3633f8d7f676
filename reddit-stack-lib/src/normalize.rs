//! Split raw comment bodies into the shapes the extractor understands.
//!
//! Comments arrive in two layouts:
//! - a single paragraph where every questionnaire answer sits on its own line
//!   (`"1) Engineer\n7) Python, dbt"`), handled as [`NormalizedComment::Flat`];
//! - several paragraphs separated by blank lines, where the tech-stack answer
//!   starts a paragraph and may run over the following ones, handled as
//!   [`NormalizedComment::Nested`].
//!
//! In the nested layout only a paragraph whose *first* line is a marker
//! opens a block. A marker further down a paragraph is not picked up.

use crate::context::RunContext;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// The lines of one comment from a marker paragraph onwards. The marker line
/// is always the first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerBlock<'a> {
    lines: Vec<&'a str>,
}

impl<'a> MarkerBlock<'a> {
    pub fn marker_line(&self) -> &'a str {
        self.lines.first().copied().unwrap_or_default()
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }
}

/// Layout of a single comment after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedComment<'a> {
    /// Single-paragraph comment: every line, in order, marker or not.
    Flat(Vec<&'a str>),
    /// Multi-paragraph comment: the marker blocks found, possibly none.
    Nested(Vec<MarkerBlock<'a>>),
}

/// Normalize one comment body.
///
/// Every paragraph led by a marker line opens a block that runs to the end of
/// the comment. With two marker paragraphs the later paragraphs belong to both
/// blocks and are counted twice.
pub fn normalize_comment<'a>(ctx: &RunContext, body: &'a str) -> NormalizedComment<'a> {
    let paragraphs: Vec<&'a str> = body.split(PARAGRAPH_SEPARATOR).collect();

    if paragraphs.len() == 1 {
        return NormalizedComment::Flat(body.split('\n').collect());
    }

    let blocks = paragraphs
        .iter()
        .enumerate()
        .filter(|(_, paragraph)| {
            let first_line = paragraph.split('\n').next().unwrap_or_default();
            ctx.marker.is_marker_line(first_line)
        })
        .map(|(i, _)| MarkerBlock {
            lines: paragraphs[i..]
                .iter()
                .copied()
                .flat_map(|paragraph| paragraph.split('\n'))
                .collect(),
        })
        .collect();

    NormalizedComment::Nested(blocks)
}

/// Normalize every body, preserving input order.
pub fn normalize_comments<'a, I>(ctx: &RunContext, bodies: I) -> Vec<NormalizedComment<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    bodies
        .into_iter()
        .map(|body| normalize_comment(ctx, body))
        .collect()
}
