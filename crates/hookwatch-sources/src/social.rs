//! Social account adapter via the `bird` CLI.
//!
//! Invokes `bird user-tweets {handle} --json -n {count} --auth-token ... --ct0 ...`
//! as a subprocess and maps the JSON timeline into [`Item`]s.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hookwatch_core::{Item, Source, SourceKind};
use serde::Deserialize;

use crate::error::SourceError;
use crate::{Fetched, SourceAdapter};

/// Twitter's legacy `created_at` layout, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const LEGACY_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Clone)]
pub struct SocialConfig {
    pub bird_bin: String,
    pub auth_token: Option<String>,
    pub ct0: Option<String>,
    pub count: u32,
}

impl std::fmt::Debug for SocialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialConfig")
            .field("bird_bin", &self.bird_bin)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("ct0", &self.ct0.as_ref().map(|_| "[redacted]"))
            .field("count", &self.count)
            .finish()
    }
}

#[derive(Deserialize)]
struct BirdTweet {
    id: String,
    text: String,
    #[serde(rename = "createdAt")]
    created_at: String,
}

/// Fetches an account's recent timeline.
pub struct SocialAdapter {
    config: SocialConfig,
}

impl SocialAdapter {
    #[must_use]
    pub fn new(config: SocialConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SourceAdapter for SocialAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn fetch(&self, source: &Source) -> Result<Fetched, SourceError> {
        let (auth_token, ct0) = match (&self.config.auth_token, &self.config.ct0) {
            (Some(a), Some(c)) => (a.as_str(), c.as_str()),
            _ => {
                return Err(SourceError::MissingCredentials(
                    "TWITTER_AUTH_TOKEN and TWITTER_CT0 are required for social sources"
                        .to_string(),
                ))
            }
        };

        let program = self.config.bird_bin.as_str();
        let count = self.config.count.to_string();
        let output = tokio::process::Command::new(program)
            .args([
                "user-tweets",
                &source.key,
                "--json",
                "-n",
                &count,
                "--auth-token",
                auth_token,
                "--ct0",
                ct0,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SourceError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(SourceError::Command {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let items = parse_timeline(&output.stdout, &source.key)?;
        Ok(Fetched {
            items,
            profile: None,
        })
    }
}

/// Parse `bird --json` timeline output into items.
///
/// Tweets whose timestamp cannot be parsed are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] if the output is not a JSON array of tweets.
pub fn parse_timeline(stdout: &[u8], handle: &str) -> Result<Vec<Item>, SourceError> {
    let tweets: Vec<BirdTweet> =
        serde_json::from_slice(stdout).map_err(|e| SourceError::Malformed {
            context: format!("user-tweets {handle}"),
            source: e,
        })?;

    let mut items = Vec::with_capacity(tweets.len());
    for tweet in tweets {
        let Some(published) = parse_tweet_time(&tweet.created_at) else {
            tracing::warn!(
                handle,
                tweet_id = %tweet.id,
                created_at = %tweet.created_at,
                "skipping tweet with unparseable timestamp"
            );
            continue;
        };
        let permalink = format!("https://x.com/{handle}/status/{}", tweet.id);
        items.push(Item::new(tweet.text, published).with_permalink(permalink));
    }
    Ok(items)
}

/// Accepts RFC 3339 and the legacy Twitter layout.
fn parse_tweet_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, LEGACY_TIME_FORMAT))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
