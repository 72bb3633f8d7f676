//! Turn tech-stack lines into candidate technology names.

use crate::context::RunContext;

/// Characters deleted from every token before stop-word filtering. `7` is
/// included because it is the questionnaire marker.
pub const NOISE_CHARS: &[char] = &[
    ',', '(', ')', '/', '\\', '[', ']', '+', '7', '.', '\t', '\n', '*', '…', ':', '“', '”',
];

/// Lowercase the lines and split them into raw tokens.
///
/// Words are separated by single spaces only, so consecutive spaces yield
/// empty tokens (dropped later). A token containing `/` becomes one token per
/// segment, so `"aws/gcp"` is two candidates.
pub fn tokenize<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in lines {
        let line = line.as_ref().to_lowercase();
        for word in line.split(' ') {
            if word.contains('/') {
                tokens.extend(word.split('/').map(str::to_string));
            } else {
                tokens.push(word.to_string());
            }
        }
    }
    tokens
}

/// Delete every noise character from `token`.
pub fn clean_token(token: &str) -> String {
    token.chars().filter(|c| !NOISE_CHARS.contains(c)).collect()
}

/// Tokenize `lines`, strip noise characters, then drop empty tokens and stop
/// words. Order is preserved and duplicates are kept.
///
/// # Example
/// ```
/// use reddit_stack_lib::{tokenize_and_clean, RunContext, StopWords};
/// let ctx = RunContext::new(StopWords::from_words(["and"]));
/// let tokens = tokenize_and_clean(&ctx, &["7) Python and AWS/GCP"]);
/// assert_eq!(tokens, vec!["python", "aws", "gcp"]);
/// ```
pub fn tokenize_and_clean<S: AsRef<str>>(ctx: &RunContext, lines: &[S]) -> Vec<String> {
    tokenize(lines)
        .iter()
        .map(|token| clean_token(token))
        .filter(|token| !token.is_empty() && !ctx.stop_words.contains(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::StopWords;

    fn ctx(stop_words: &[&str]) -> RunContext {
        RunContext::new(StopWords::from_words(stop_words))
    }

    #[test]
    fn test_tokenize_lowercases_and_splits_on_space() {
        assert_eq!(
            tokenize(&["Terraform, AWS S3"]),
            vec!["terraform,", "aws", "s3"]
        );
    }

    #[test]
    fn test_slash_splitting() {
        assert_eq!(tokenize(&["aws/gcp"]), vec!["aws", "gcp"]);
        assert_eq!(
            tokenize_and_clean(&ctx(&["the"]), &["AWS/GCP/Azure"]),
            vec!["aws", "gcp", "azure"]
        );
    }

    #[test]
    fn test_clean_token_strips_noise() {
        assert_eq!(clean_token("(spark),"), "spark");
        assert_eq!(clean_token("“dbt”…"), "dbt");
        assert_eq!(clean_token("**python**:"), "python");
        assert_eq!(clean_token("[c++]"), "c");
        assert_eq!(clean_token("7)"), "");
        assert_eq!(clean_token("node.js"), "nodejs");
    }

    #[test]
    fn test_noise_removed_by_character_not_substring() {
        assert_eq!(clean_token("python3.7"), "python3");
        assert_eq!(clean_token("k8s"), "k8s");
    }

    #[test]
    fn test_empty_and_stop_words_dropped() {
        let ctx = ctx(&["and", "the", "stack"]);
        assert_eq!(
            tokenize_and_clean(&ctx, &["7)  Tech stack: Python  and the  Airflow"]),
            vec!["tech", "python", "airflow"]
        );
    }

    #[test]
    fn test_duplicates_kept_in_order() {
        let ctx = ctx(&["the"]);
        assert_eq!(
            tokenize_and_clean(&ctx, &["7) AWS, Python", "AWS"]),
            vec!["aws", "python", "aws"]
        );
    }

    #[test]
    fn test_input_lines_untouched() {
        let ctx = ctx(&["the"]);
        let lines = vec!["7) Python".to_string()];
        let _ = tokenize_and_clean(&ctx, lines.as_slice());
        assert_eq!(lines, vec!["7) Python".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        let lines: [&str; 0] = [];
        assert!(tokenize_and_clean(&ctx(&["the"]), &lines).is_empty());
    }
}
