use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Profile page prefix for social accounts.
const SOCIAL_PROFILE_BASE: &str = "https://x.com/";

/// What kind of origin a [`Source`] is. Drives adapter selection and the
/// formatting rules applied to its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Social,
    Feed,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Social => write!(f, "social"),
            SourceKind::Feed => write!(f, "feed"),
        }
    }
}

/// One configured content origin: a social account handle or a feed URL.
///
/// Built once at startup from the sources file and never mutated. Metadata
/// discovered while polling is overlaid on a per-tick copy via
/// [`Source::with_profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique key: the account handle (without `@`) or the feed URL.
    pub key: String,
    pub kind: SourceKind,
    /// Configured display name. See [`Source::display_name`] for the fallback.
    pub name: Option<String>,
    pub icon_url: Option<String>,
    /// Link to the origin's human-facing page.
    pub home_url: Option<String>,
}

/// Metadata an adapter learned about a source while fetching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceProfile {
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub home_url: Option<String>,
}

impl Source {
    /// A social account. A leading `@` on `handle` is dropped.
    #[must_use]
    pub fn social(handle: &str, name: Option<String>, avatar: Option<String>) -> Self {
        let handle = handle.trim().trim_start_matches('@').to_string();
        let home_url = format!(
            "{SOCIAL_PROFILE_BASE}{}",
            utf8_percent_encode(&handle, NON_ALPHANUMERIC)
        );
        Self {
            key: handle,
            kind: SourceKind::Social,
            name,
            icon_url: avatar,
            home_url: Some(home_url),
        }
    }

    /// A syndication feed keyed by its URL.
    #[must_use]
    pub fn feed(url: &str, name: Option<String>, icon: Option<String>) -> Self {
        Self {
            key: url.trim().to_string(),
            kind: SourceKind::Feed,
            name,
            icon_url: icon,
            home_url: None,
        }
    }

    /// Name shown as the sender: the configured name, else `@handle` for
    /// accounts and the feed URL for feeds.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.name, self.kind) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, SourceKind::Social) => format!("@{}", self.key),
            (_, SourceKind::Feed) => self.key.clone(),
        }
    }

    /// Human-facing page for the source, falling back to the key itself.
    #[must_use]
    pub fn home_url(&self) -> &str {
        self.home_url.as_deref().unwrap_or(&self.key)
    }

    /// Returns a copy with unset fields filled from `profile`.
    ///
    /// Configured values always win over fetched ones.
    #[must_use]
    pub fn with_profile(&self, profile: &SourceProfile) -> Self {
        let pick = |configured: &Option<String>, fetched: &Option<String>| {
            configured
                .clone()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fetched.clone().filter(|v| !v.trim().is_empty()))
        };
        Self {
            key: self.key.clone(),
            kind: self.kind,
            name: pick(&self.name, &profile.name),
            icon_url: pick(&self.icon_url, &profile.icon_url),
            home_url: pick(&self.home_url, &profile.home_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_strips_at_and_builds_profile_url() {
        let source = Source::social("@BBCBweaking", None, None);
        assert_eq!(source.key, "BBCBweaking");
        assert_eq!(source.home_url(), "https://x.com/BBCBweaking");
        assert_eq!(source.display_name(), "@BBCBweaking");
    }

    #[test]
    fn social_profile_url_is_percent_encoded() {
        let source = Source::social("odd handle", None, None);
        assert_eq!(source.home_url(), "https://x.com/odd%20handle");
    }

    #[test]
    fn feed_display_name_falls_back_to_url() {
        let source = Source::feed("https://www.dutchnews.nl/feed/", None, None);
        assert_eq!(source.display_name(), "https://www.dutchnews.nl/feed/");
        assert_eq!(source.home_url(), "https://www.dutchnews.nl/feed/");
    }

    #[test]
    fn blank_configured_name_is_ignored() {
        let source = Source::feed("https://a.test/rss", Some("  ".to_string()), None);
        assert_eq!(source.display_name(), "https://a.test/rss");
    }

    #[test]
    fn with_profile_fills_missing_fields_only() {
        let source = Source::feed(
            "https://a.test/rss",
            Some("Configured".to_string()),
            None,
        );
        let profile = SourceProfile {
            name: Some("Fetched Title".to_string()),
            icon_url: Some("https://a.test/logo.png".to_string()),
            home_url: Some("https://a.test/".to_string()),
        };
        let merged = source.with_profile(&profile);
        assert_eq!(merged.display_name(), "Configured");
        assert_eq!(merged.icon_url.as_deref(), Some("https://a.test/logo.png"));
        assert_eq!(merged.home_url(), "https://a.test/");
        assert_eq!(merged.key, source.key);
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&SourceKind::Social).unwrap();
        assert_eq!(json, "\"social\"");
        assert_eq!(SourceKind::Feed.to_string(), "feed");
    }
}
