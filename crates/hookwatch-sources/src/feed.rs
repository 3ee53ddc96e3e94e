//! Syndication feed adapter (RSS, Atom and JSON Feed via `feed-rs`).

use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::{Entry, Feed, Link};
use hookwatch_core::{Item, Source, SourceKind, SourceProfile};
use reqwest::Client;

use crate::error::SourceError;
use crate::{Fetched, SourceAdapter};

/// Fetches a feed over HTTP and converts its entries into [`Item`]s.
pub struct FeedAdapter {
    client: Client,
}

impl FeedAdapter {
    /// Creates an adapter with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self, source: &Source) -> Result<Fetched, SourceError> {
        let response = self.client.get(&source.key).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: source.key.clone(),
            });
        }
        let body = response.bytes().await?;
        parse_feed(&body, &source.key)
    }
}

/// Parse a raw feed document into a [`Fetched`] batch.
///
/// Entries without any timestamp cannot be placed relative to a watermark
/// and are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError::FeedParse`] if the document is not a recognised feed.
pub fn parse_feed(body: &[u8], feed_url: &str) -> Result<Fetched, SourceError> {
    let feed = feed_rs::parser::parse(body)?;
    let profile = profile_of(&feed);

    let mut items = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        match entry_to_item(entry) {
            Some(item) => items.push(item),
            None => tracing::warn!(feed = feed_url, "skipping feed entry without timestamp"),
        }
    }

    Ok(Fetched {
        items,
        profile: Some(profile),
    })
}

fn profile_of(feed: &Feed) -> SourceProfile {
    SourceProfile {
        name: feed
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty()),
        icon_url: feed
            .logo
            .as_ref()
            .or(feed.icon.as_ref())
            .map(|img| img.uri.clone()),
        home_url: page_link(&feed.links),
    }
}

fn entry_to_item(entry: Entry) -> Option<Item> {
    let published = entry.published.or(entry.updated)?;

    let body = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let mut item = Item::new(body, published);
    if let Some(title) = entry.title.map(|t| t.content) {
        item = item.with_title(title);
    }
    if let Some(link) = page_link(&entry.links) {
        item = item.with_permalink(link);
    }
    Some(item)
}

/// First link that points at a human-facing page rather than the feed
/// itself or an attachment.
fn page_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| !matches!(l.rel.as_deref(), Some("self" | "enclosure" | "hub")))
        .map(|l| l.href.clone())
}
