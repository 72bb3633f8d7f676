use crate::context::RunContext;
use crate::normalize::NormalizedComment;

/// Collect the lines that carry tech-stack answers.
///
/// Marker lines from flat comments come first, in comment order, followed by
/// every line of every nested marker block.
pub fn extract_stack_lines<'a>(
    ctx: &RunContext,
    comments: &[NormalizedComment<'a>],
) -> Vec<&'a str> {
    let mut lines = Vec::new();
    let mut block_lines = Vec::new();

    for comment in comments {
        match comment {
            NormalizedComment::Flat(flat) => {
                lines.extend(
                    flat.iter()
                        .copied()
                        .filter(|line| ctx.marker.is_marker_line(line)),
                );
            }
            NormalizedComment::Nested(blocks) => {
                for block in blocks {
                    block_lines.extend_from_slice(block.lines());
                }
            }
        }
    }

    lines.extend(block_lines);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_comments;
    use crate::reference::StopWords;

    #[test]
    fn test_flat_matches_before_blocks() {
        let ctx = RunContext::new(StopWords::from_words(["the"]));
        let comments = normalize_comments(
            &ctx,
            [
                "Intro\n\n7) Snowflake\ndbt",
                "1) Analyst\n7) Excel, Tableau",
                "",
                "7. Databricks",
            ],
        );

        assert_eq!(
            extract_stack_lines(&ctx, &comments),
            vec!["7) Excel, Tableau", "7. Databricks", "7) Snowflake", "dbt"]
        );
    }

    #[test]
    fn test_non_marker_lines_dropped() {
        let ctx = RunContext::new(StopWords::from_words(["the"]));
        let comments = normalize_comments(&ctx, ["17. Something else\n6) Python\nno marker here"]);
        assert!(extract_stack_lines(&ctx, &comments).is_empty());
    }
}
