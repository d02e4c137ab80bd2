//! Query-term highlighting for search results.
//!
//! Each whitespace-separated token of the query marks every case-insensitive literal
//! occurrence in the text, leftmost first and without overlap. Tokens are applied in the
//! order they were typed, and a later token only looks at text that no earlier token marked.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Mark(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(text) | Segment::Mark(text) => text,
        }
    }
}

/// Compiled query tokens, reusable across every text of a result set.
#[derive(Debug, Clone)]
pub struct Highlighter {
    tokens: Vec<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        let tokens = query
            .split_whitespace()
            .filter_map(|token| {
                RegexBuilder::new(&regex::escape(token))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| tracing::warn!(token, "skipping highlight token: {e}"))
                    .ok()
            })
            .collect();
        Self { tokens }
    }

    /// Splits `text` into plain and marked segments.
    ///
    /// Empty segments are never produced, so empty text yields no segments.
    pub fn apply(&self, text: &str) -> Vec<Segment> {
        let mut segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Plain(text.to_string())]
        };

        for token in &self.tokens {
            segments = segments
                .into_iter()
                .flat_map(|segment| match segment {
                    Segment::Plain(plain) => split_on(token, &plain),
                    marked => vec![marked],
                })
                .collect();
        }

        segments
    }
}

fn split_on(token: &Regex, text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for m in token.find_iter(text) {
        if m.start() > cursor {
            out.push(Segment::Plain(text[cursor..m.start()].to_string()));
        }
        out.push(Segment::Mark(m.as_str().to_string()));
        cursor = m.end();
    }
    if cursor < text.len() {
        out.push(Segment::Plain(text[cursor..].to_string()));
    }
    out
}

/// Highlights `text` for a one-off query.
pub fn highlight(text: &str, query: &str) -> Vec<Segment> {
    Highlighter::new(query).apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Segment {
        Segment::Plain(s.to_string())
    }

    fn mark(s: &str) -> Segment {
        Segment::Mark(s.to_string())
    }

    #[test]
    fn marks_every_occurrence_case_insensitively() {
        assert_eq!(
            highlight("Node 1 content, CONTENT", "ent"),
            vec![
                plain("Node 1 cont"),
                mark("ent"),
                plain(", CONT"),
                mark("ENT"),
            ]
        );
    }

    #[test]
    fn earlier_tokens_take_precedence() {
        assert_eq!(
            highlight("abcd", "bc ab"),
            vec![plain("a"), mark("bc"), plain("d")]
        );
        assert_eq!(
            highlight("abcd", "ab bc"),
            vec![mark("ab"), plain("cd")]
        );
    }

    #[test]
    fn matches_do_not_overlap() {
        assert_eq!(highlight("aaa", "aa"), vec![mark("aa"), plain("a")]);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert_eq!(
            highlight("1+1 = 2", "1+1"),
            vec![mark("1+1"), plain(" = 2")]
        );
    }

    #[test]
    fn blank_query_or_text() {
        assert_eq!(highlight("text", "   "), vec![plain("text")]);
        assert!(highlight("", "x").is_empty());
    }
}
