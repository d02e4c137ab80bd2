//! HTML and URL sanitisation for node content.
//!
//! Text bodies pass through a [`Sanitize`] implementation before placeholder substitution.
//! The default [`HtmlSanitizer`] keeps a small allow-list of formatting tags, removes
//! `<script>` and `<style>` elements together with their contents and drops every other tag
//! while keeping its inner text. It never rewrites `{`, `|` or `}`, so placeholders survive.

use crate::constants::BLANK_URL;
use regex::Regex;
use std::sync::OnceLock;

/// Trusted sanitisation collaborator: `sanitize(html) -> safe html`.
pub trait Sanitize: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Tags that survive sanitisation. Attributes are stripped except `href` on `a`.
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "br", "code", "em", "i", "li", "ol", "p", "pre", "span", "strong", "ul",
];

/// Elements removed together with everything up to their closing tag.
const DROPPED_WITH_CONTENT: &[&str] = &["script", "style"];

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)\b([^>]*)>")
            .expect("tag pattern is valid")
    })
}

fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
            .expect("href pattern is valid")
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitize for HtmlSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        let mut skip_until: Option<String> = None;

        for caps in tag_pattern().captures_iter(html) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let name = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());

            if let Some(open) = &skip_until {
                if closing && name.as_deref() == Some(open.as_str()) {
                    skip_until = None;
                }
                cursor = whole.end();
                continue;
            }

            push_text(&mut out, &html[cursor..whole.start()]);
            cursor = whole.end();

            // Comments carry no tag name.
            let Some(name) = name else {
                continue;
            };

            if DROPPED_WITH_CONTENT.contains(&name.as_str()) {
                if !closing {
                    skip_until = Some(name);
                }
                continue;
            }
            if !ALLOWED_TAGS.contains(&name.as_str()) {
                continue;
            }

            if closing {
                out.push_str(&format!("</{name}>"));
            } else if name == "a" {
                let attrs = caps.get(3).map_or("", |m| m.as_str());
                match extract_href(attrs) {
                    Some(href) => out.push_str(&format!(
                        "<a href=\"{}\">",
                        escape_attribute(&sanitize_url(href))
                    )),
                    None => out.push_str("<a>"),
                }
            } else {
                out.push_str(&format!("<{name}>"));
            }
        }

        if skip_until.is_none() {
            let tail = &html[cursor..];
            // A tag still open at the end of input is dropped whole, attributes included.
            let end = unterminated_tag_start(tail).unwrap_or(tail.len());
            if end < tail.len() {
                tracing::debug!("dropped unterminated tag");
            }
            push_text(&mut out, &tail[..end]);
        }
        out
    }
}

// Text between tags can still hold a bare `<`; it must never open markup downstream.
fn push_text(out: &mut String, text: &str) {
    out.push_str(&text.replace('<', "&lt;"));
}

fn unterminated_tag_start(text: &str) -> Option<usize> {
    text.match_indices('<').map(|(i, _)| i).find(|&i| {
        text[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!')
    })
}

fn extract_href(attrs: &str) -> Option<&str> {
    let caps = href_pattern().captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replaces URLs with a script-capable scheme by `about:blank`.
///
/// Whitespace and control characters are ignored when detecting the scheme, so inputs such as
/// `" java\tscript:alert(1)"` are caught. Empty input also maps to `about:blank`.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim_matches(|c: char| c.is_whitespace() || c.is_control());
    if trimmed.is_empty() {
        return BLANK_URL.to_string();
    }

    let scheme_probe: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    let dangerous = ["javascript:", "data:", "vbscript:"]
        .iter()
        .any(|scheme| scheme_probe.starts_with(scheme));

    if dangerous {
        tracing::debug!("replaced unsafe url scheme");
        BLANK_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        HtmlSanitizer::new().sanitize(html)
    }

    #[test]
    fn placeholders_survive() {
        let body = "{v1|} Node 3 {v3|Variable 3 default} content {v2|v2-default}.";
        assert_eq!(clean(body), body);
    }

    #[test]
    fn script_elements_are_removed_with_content() {
        assert_eq!(clean("a<script>alert(1)</script>b"), "ab");
        assert_eq!(clean("a<SCRIPT type=x>x<b>y</b></Script>b"), "ab");
        assert_eq!(clean("<script>never closed"), "");
    }

    #[test]
    fn only_markup_yields_empty_string() {
        assert_eq!(clean("<img src=x onerror=alert(1)><!-- note -->"), "");
    }

    #[test]
    fn unterminated_tags_are_dropped() {
        let out = clean("hi <img src=x onerror=alert(1)//");
        assert_eq!(out, "hi ");
        assert!(!out.contains("onerror"));
        assert_eq!(clean("<b>ok</b> <a href=x onclick=evil()"), "<b>ok</b> ");
        assert_eq!(clean("note <!-- never closed"), "note ");
    }

    #[test]
    fn bare_angle_brackets_are_escaped() {
        assert_eq!(clean("1 < 2 and 3 > 2"), "1 &lt; 2 and 3 > 2");
        assert_eq!(clean("<p>a < b</p>"), "<p>a &lt; b</p>");
    }

    #[test]
    fn allowed_tags_lose_attributes() {
        assert_eq!(
            clean(r#"<p class="x" onclick="evil()">hi <strong>there</strong></p>"#),
            "<p>hi <strong>there</strong></p>"
        );
        assert_eq!(clean("<div>inner</div>"), "inner");
    }

    #[test]
    fn links_keep_sanitised_href() {
        assert_eq!(
            clean(r#"<a href="https://example.com/?a=1&b=2" target="_blank">x</a>"#),
            r#"<a href="https://example.com/?a=1&amp;b=2">x</a>"#
        );
        assert_eq!(
            clean("<a href='javascript:alert(1)'>x</a>"),
            r#"<a href="about:blank">x</a>"#
        );
    }

    #[test]
    fn url_schemes() {
        assert_eq!(sanitize_url("/images/a.png"), "/images/a.png");
        assert_eq!(sanitize_url("https://x/y.png"), "https://x/y.png");
        assert_eq!(sanitize_url(" java\tscript:alert(1)"), BLANK_URL);
        assert_eq!(sanitize_url("DATA:text/html;base64,xx"), BLANK_URL);
        assert_eq!(sanitize_url("   "), BLANK_URL);
    }
}
