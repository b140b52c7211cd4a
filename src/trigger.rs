//! Trigger detection: is the user in the middle of typing a mention?

use regex::Regex;
use serde::Serialize;

use crate::error::MentionError;

/// A detected trigger: the partial query and the span a commit replaces.
///
/// Offsets are character offsets into the field value; `start` points at the
/// delimiter and `end` at the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchContext {
    pub query: String,
    pub start: usize,
    pub end: usize,
}

impl MatchContext {
    pub fn new(query: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            query: query.into(),
            start,
            end,
        }
    }

    /// Length of the replaced span in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Default trigger grammar: start-of-text or whitespace, the delimiter, then a
/// query of `[A-Za-z0-9._-]*` with at most one ` word` tail, ending at the cursor.
///
/// Word and space classes are ASCII only.
pub fn default_search_pattern(delimiter: char) -> String {
    format!(
        r"(?:(?-u:\s)+|^){}([A-Za-z0-9._-]*(?: (?-u:\w)+)?)$",
        regex::escape(&delimiter.to_string())
    )
}

#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    delimiter: char,
    pattern: Regex,
}

impl TriggerMatcher {
    pub fn new(delimiter: char) -> Self {
        let pattern = Regex::new(&default_search_pattern(delimiter))
            .expect("default search pattern is valid for any escaped delimiter");
        Self { delimiter, pattern }
    }

    /// Use an alternative trigger grammar.
    ///
    /// The query is taken from a `query` named group, else the first group.
    /// The replaced span starts at the first delimiter inside the match.
    pub fn with_pattern(delimiter: char, pattern: &str) -> Result<Self, MentionError> {
        let pattern = Regex::new(pattern).map_err(|source| MentionError::SearchPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { delimiter, pattern })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Match against the text to the left of the cursor.
    ///
    /// Returns `None` when no trigger ends exactly at the cursor.
    pub fn match_trigger(&self, text_before_cursor: &str) -> Option<MatchContext> {
        let caps = self.pattern.captures(text_before_cursor)?;
        let whole = caps.get(0)?;
        if whole.end() != text_before_cursor.len() {
            return None;
        }

        let query = caps
            .name("query")
            .or_else(|| caps.get(1))
            .map_or("", |m| m.as_str());

        let span_start = whole
            .as_str()
            .find(self.delimiter)
            .map_or(whole.start(), |offset| whole.start() + offset);

        let start = char_offset(text_before_cursor, span_start);
        let end = char_offset(text_before_cursor, whole.end());
        tracing::trace!(query, start, end, "trigger matched");
        Some(MatchContext::new(query, start, end))
    }
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::new(crate::codec::DEFAULT_DELIMITER)
    }
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}
