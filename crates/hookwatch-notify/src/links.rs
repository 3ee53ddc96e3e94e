//! Embedded link extraction.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhttps?://[^\s<>"'`]+"#).expect("valid url regex"));

/// Trailing characters that end a sentence rather than a URL.
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// All `http(s)` links in `text`, in order of appearance.
#[must_use]
pub fn extract_links(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .map(|m| trim_url(m.as_str()).to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// `text` with every link removed and the surrounding whitespace tidied.
#[must_use]
pub fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        let url = trim_url(m.as_str());
        out.push_str(&text[last..m.start()]);
        last = m.start() + url.len();
    }
    out.push_str(&text[last..]);
    out.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Drops trailing punctuation, keeping a closing paren that balances one
/// inside the URL (`https://en.wikipedia.org/wiki/Rust_(language)`).
fn trim_url(url: &str) -> &str {
    let mut end = url.len();
    while let Some(c) = url[..end].chars().next_back() {
        if !TRAILING_PUNCT.contains(&c) {
            break;
        }
        if c == ')' {
            let body = &url[..end];
            if body.matches('(').count() >= body.matches(')').count() {
                break;
            }
        }
        end -= c.len_utf8();
    }
    &url[..end]
}
