//! Item → notification mapping, polymorphic over [`SourceKind`].

use std::sync::Arc;

use hookwatch_core::{Item, Source, SourceKind};

use crate::links::{extract_links, strip_links};
use crate::payload::NotificationPayload;
use crate::transform::{Identity, StripMarkup, TextTransform};

/// Builds [`NotificationPayload`]s.
///
/// Deterministic: the output depends only on the item, the source and the
/// two configured transforms.
#[derive(Clone)]
pub struct Formatter {
    title_transform: Arc<dyn TextTransform>,
    body_transform: Arc<dyn TextTransform>,
}

impl Default for Formatter {
    /// Titles pass through unchanged, bodies are stripped of markup.
    fn default() -> Self {
        Self::new(Arc::new(Identity), Arc::new(StripMarkup))
    }
}

impl Formatter {
    #[must_use]
    pub fn new(
        title_transform: Arc<dyn TextTransform>,
        body_transform: Arc<dyn TextTransform>,
    ) -> Self {
        Self {
            title_transform,
            body_transform,
        }
    }

    /// Map one item of `source` to its notification.
    ///
    /// Social posts: the title is the post text without its links, the
    /// primary link is the first embedded link (else the permalink) and the
    /// description enumerates the links followed by the permalink.
    ///
    /// Feed entries: the title is the entry title (else the first line of the
    /// body, links removed), the description is the transformed body and the
    /// primary link is the permalink (else the first embedded link).
    #[must_use]
    pub fn format(&self, item: &Item, source: &Source) -> NotificationPayload {
        let sender_name = source.display_name();
        let links = if item.links.is_empty() {
            extract_links(&item.body)
        } else {
            item.links.clone()
        };

        let (title, description, link) = match source.kind {
            SourceKind::Social => {
                let title = self.title_transform.apply(&strip_links(&item.body));
                let link = links
                    .first()
                    .cloned()
                    .or_else(|| item.permalink.clone())
                    .unwrap_or_default();
                (title, describe_links(&links, item.permalink.as_deref()), link)
            }
            SourceKind::Feed => {
                let description = self.body_transform.apply(&item.body);
                let raw_title = match item.title.as_deref() {
                    Some(t) if !t.trim().is_empty() => t.trim().to_string(),
                    _ => first_line(&strip_links(&description)),
                };
                let link = item
                    .permalink
                    .clone()
                    .or_else(|| links.first().cloned())
                    .unwrap_or_default();
                (self.title_transform.apply(&raw_title), description, link)
            }
        };

        NotificationPayload {
            lead: format!("New post by {sender_name}!"),
            sender_icon: source.icon_url.clone(),
            author_url: source.home_url().to_string(),
            sender_name,
            title,
            description,
            link,
            timestamp: item.published,
        }
    }
}

/// One indexed line per embedded link, then the permalink.
fn describe_links(links: &[String], permalink: Option<&str>) -> String {
    let mut out = String::new();
    for (i, link) in links.iter().enumerate() {
        out.push_str(&format!("Url[{i}] = {link}\n"));
    }
    if let Some(permalink) = permalink {
        out.push_str(&format!("\nPost url = {permalink}"));
    }
    out.trim().to_string()
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
