use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Endpoint limits on field lengths, in characters.
const MAX_CONTENT: usize = 2000;
const MAX_USERNAME: usize = 80;
const MAX_TITLE: usize = 256;
const MAX_DESCRIPTION: usize = 4096;
const MAX_AUTHOR_NAME: usize = 256;

/// Canonical, sink-agnostic notification for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub sender_name: String,
    pub sender_icon: Option<String>,
    /// Short lead line, e.g. `New post by @BBCBweaking!`.
    pub lead: String,
    pub title: String,
    pub description: String,
    /// Primary link. Empty when neither the body nor the item had one.
    pub link: String,
    /// Link to the source's own page.
    pub author_url: String,
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    /// Timestamp in RFC 3339 / ISO-8601 with a `Z` suffix.
    #[must_use]
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// The webhook wire message for this payload, with every field cut to
    /// the endpoint's length limits.
    #[must_use]
    pub fn to_webhook_message(&self) -> WebhookMessage {
        let icon = self.sender_icon.clone().unwrap_or_default();
        WebhookMessage {
            content: truncate(&self.lead, MAX_CONTENT),
            username: truncate(&self.sender_name, MAX_USERNAME),
            avatar_url: icon.clone(),
            embeds: vec![Embed {
                title: truncate(&self.title, MAX_TITLE),
                description: truncate(&self.description, MAX_DESCRIPTION),
                url: self.link.clone(),
                timestamp: self.timestamp_iso(),
                author: EmbedAuthor {
                    name: truncate(&self.sender_name, MAX_AUTHOR_NAME),
                    url: self.author_url.clone(),
                    icon_url: icon,
                },
            }],
        }
    }
}

/// Outbound JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub content: String,
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub timestamp: String,
    pub author: EmbedAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

/// Cut `text` to at most `max` characters, ending in an ellipsis when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}
