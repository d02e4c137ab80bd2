//! Placeholder substitution for text content.
//!
//! Text bodies may embed `{variableId|defaultText}` tokens. The id is zero or more ASCII word
//! characters; the default is zero or more characters other than `{`, `}` and `|`, so defaults
//! such as `Variable 3 default` keep their spaces.
//!
//! [`render`] turns a body into an ordered list of [`Run`]s: literal text between placeholders,
//! and one variable run per placeholder carrying its display value.
//!
//! A placeholder resolves to the variable's `name` when its id is non-empty and known, and to
//! its default text otherwise. A placeholder that resolves to an empty string still yields a
//! variable run so it stays distinguishable from plain text.

use crate::store::Variables;
use regex::Regex;
use std::sync::OnceLock;

/// One piece of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Literal(String),
    Variable(String),
}

impl Run {
    pub fn text(&self) -> &str {
        match self {
            Run::Literal(text) | Run::Variable(text) => text,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Run::Variable(_))
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_]*)\|([^{}|]*)\}").expect("placeholder pattern is valid")
    })
}

/// Cheap pre-check used to skip the scan for plain text.
pub fn has_placeholder(text: &str) -> bool {
    placeholder_pattern().is_match(text)
}

/// Renders `raw` against `variables`.
///
/// Placeholders are matched left to right without overlap; scanning resumes directly after
/// each consumed placeholder. Zero-length literal runs are never emitted, so empty input
/// yields no runs and text without placeholders yields exactly one literal run.
///
/// # Arguments
///
/// * `raw` - Sanitised text body
/// * `variables` - Variable dictionary keyed by id
///
/// # Returns
///
/// The ordered literal and variable runs. The output depends only on the inputs.
pub fn render(raw: &str, variables: &Variables) -> Vec<Run> {
    if !has_placeholder(raw) {
        return if raw.is_empty() {
            Vec::new()
        } else {
            vec![Run::Literal(raw.to_string())]
        };
    }

    let mut runs = Vec::new();
    let mut cursor = 0;

    for caps in placeholder_pattern().captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(Run::Literal(raw[cursor..whole.start()].to_string()));
        }

        let variable_id = caps.get(1).map_or("", |m| m.as_str());
        let default_text = caps.get(2).map_or("", |m| m.as_str());
        let value = if variable_id.is_empty() {
            default_text
        } else {
            variables
                .get(variable_id)
                .map_or(default_text, |variable| variable.name.as_str())
        };
        runs.push(Run::Variable(value.to_string()));

        cursor = whole.end();
    }

    if cursor < raw.len() {
        runs.push(Run::Literal(raw[cursor..].to_string()));
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiki_types::Variable;

    fn vars() -> Variables {
        [Variable::new("v1", "Variable 1"), Variable::new("v2", "Variable 2")]
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect()
    }

    fn lit(s: &str) -> Run {
        Run::Literal(s.to_string())
    }

    fn var(s: &str) -> Run {
        Run::Variable(s.to_string())
    }

    #[test]
    fn resolves_names_and_falls_back_to_defaults() {
        let runs = render(
            "{v1|} Node 3 {v3|Variable 3 default} content {v2|v2-default}.",
            &vars(),
        );
        assert_eq!(
            runs,
            vec![
                var("Variable 1"),
                lit(" Node 3 "),
                var("Variable 3 default"),
                lit(" content "),
                var("Variable 2"),
                lit("."),
            ]
        );
    }

    #[test]
    fn id_must_be_word_characters() {
        assert_eq!(render("{v-1|x}", &vars()), vec![lit("{v-1|x}")]);
        assert_eq!(render("{v1|a|b}", &vars()), vec![lit("{v1|a|b}")]);
    }

    #[test]
    fn plain_text_is_one_literal_run() {
        assert_eq!(render("Node 1 content", &vars()), vec![lit("Node 1 content")]);
        assert!(render("", &vars()).is_empty());
        assert!(!has_placeholder("curly {braces} but no bar"));
    }

    #[test]
    fn empty_id_uses_default_even_when_empty() {
        assert_eq!(render("{|fallback}", &vars()), vec![var("fallback")]);
        assert_eq!(render("a{|}b", &vars()), vec![lit("a"), var(""), lit("b")]);
    }

    #[test]
    fn adjacent_placeholders_emit_no_empty_literals() {
        assert_eq!(
            render("{v1|x}{v2|y}", &vars()),
            vec![var("Variable 1"), var("Variable 2")]
        );
    }

    #[test]
    fn scanning_resumes_after_consumed_placeholder() {
        // The inner token is the leftmost complete match; the outer brace stays literal.
        assert_eq!(
            render("{{v1|a}|b}", &vars()),
            vec![lit("{"), var("Variable 1"), lit("|b}")]
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let text = "{v1|} and {v9|nine}";
        assert_eq!(render(text, &vars()), render(text, &vars()));
    }
}
