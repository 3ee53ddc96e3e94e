use chrono::{DateTime, Utc};

/// One unit of content fetched from a [`crate::Source`] during a poll.
///
/// Items are transient: produced by an adapter, judged by discovery, turned
/// into at most one notification, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Headline, when the origin has one separate from the body (feeds).
    pub title: Option<String>,
    /// Post text or entry summary. May contain markup for feeds.
    pub body: String,
    /// Canonical link to the item itself.
    pub permalink: Option<String>,
    pub published: DateTime<Utc>,
    /// Links the origin already extracted from the body, if it does that.
    pub links: Vec<String>,
}

impl Item {
    #[must_use]
    pub fn new(body: impl Into<String>, published: DateTime<Utc>) -> Self {
        Self {
            title: None,
            body: body.into(),
            permalink: None,
            published,
            links: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = Some(permalink.into());
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }
}
