//! Detection of the questionnaire item that introduces a tech-stack answer.
//!
//! Respondents answer a fixed, numbered questionnaire and the tech-stack
//! question sits at position 7. A marker line is therefore just a line that
//! starts with that number, e.g. `7) Tech stack:` or `7. Python, dbt`.
//! Re-numbering the questionnaire breaks detection unless the question
//! number is changed here.

/// Questionnaire position of the tech-stack question in the source thread.
pub const DEFAULT_QUESTION: u32 = 7;

/// Line-start marker for one questionnaire item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPattern {
    prefix: String,
}

impl MarkerPattern {
    pub fn new(question: u32) -> Self {
        Self {
            prefix: question.to_string(),
        }
    }

    pub fn question(&self) -> &str {
        &self.prefix
    }

    /// Returns true when `line` starts with the question number.
    ///
    /// The match is anchored at the first character: `" 7)"` and `"17."`
    /// are not markers. Whatever follows the number (`)`, `.`, text, more
    /// digits) is not validated.
    ///
    /// # Example
    /// ```
    /// use reddit_stack_lib::MarkerPattern;
    /// let marker = MarkerPattern::default();
    /// assert!(marker.is_marker_line("7) Tech stack:"));
    /// assert!(!marker.is_marker_line("17. Something else"));
    /// ```
    pub fn is_marker_line(&self, line: &str) -> bool {
        line.starts_with(self.prefix.as_str())
    }
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTION)
    }
}

/// [`MarkerPattern::is_marker_line`] for the default question.
pub fn is_marker_line(line: &str) -> bool {
    MarkerPattern::default().is_marker_line(line)
}
