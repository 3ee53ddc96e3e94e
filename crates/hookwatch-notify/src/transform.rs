//! Pluggable text transforms applied by the formatter.
//!
//! Sanitizing and decorating text is not the formatter's business; it takes
//! whatever [`TextTransform`] it is given for titles and for bodies.

use std::sync::Arc;

/// A pure text-to-text step.
pub trait TextTransform: Send + Sync {
    fn apply(&self, text: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl TextTransform for Identity {
    fn apply(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Strips markup tags, decodes the common entities and normalizes whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripMarkup;

impl TextTransform for StripMarkup {
    fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut tag = String::new();
        let mut in_tag = false;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '<' if !in_tag && chars.peek().is_some_and(|&next| opens_tag(next)) => {
                    in_tag = true;
                    tag.clear();
                }
                '>' if in_tag => {
                    in_tag = false;
                    if is_block_tag(&tag) {
                        out.push(' ');
                    }
                }
                _ if in_tag => tag.push(ch),
                _ => out.push(ch),
            }
        }
        decode_entities(&out)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A `<` starts a tag only when followed by a name, `/`, `!` or `?`.
fn opens_tag(next: char) -> bool {
    next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')
}

/// Tags that break a line when rendered, so `a<br>b` reads as two words.
fn is_block_tag(tag: &str) -> bool {
    const BLOCK_TAGS: &[&str] = &[
        "br", "p", "div", "li", "ul", "ol", "tr", "td", "th", "blockquote", "h1", "h2", "h3",
        "h4", "h5", "h6", "hr",
    ];
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

/// Runs several transforms in order.
#[derive(Clone, Default)]
pub struct Chain(Vec<Arc<dyn TextTransform>>);

impl Chain {
    #[must_use]
    pub fn new(steps: Vec<Arc<dyn TextTransform>>) -> Self {
        Self(steps)
    }
}

impl TextTransform for Chain {
    fn apply(&self, text: &str) -> String {
        self.0
            .iter()
            .fold(text.to_string(), |acc, step| step.apply(&acc))
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&#8217;", "\u{2019}")
        .replace("&amp;", "&")
}
