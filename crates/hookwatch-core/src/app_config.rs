use std::path::PathBuf;

use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Delivery endpoint. Carries a secret token in its path.
    pub webhook_url: Url,
    pub sources_path: PathBuf,
    pub social_cron: String,
    pub feed_cron: String,
    pub fetch_timeout_secs: u64,
    pub delivery_timeout_secs: u64,
    pub max_concurrent_sources: usize,
    pub user_agent: String,
    pub bird_bin: String,
    pub tweets_per_poll: u32,
    pub twitter_auth_token: Option<String>,
    pub twitter_ct0: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("webhook_url", &"[redacted]")
            .field("sources_path", &self.sources_path)
            .field("social_cron", &self.social_cron)
            .field("feed_cron", &self.feed_cron)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("delivery_timeout_secs", &self.delivery_timeout_secs)
            .field("max_concurrent_sources", &self.max_concurrent_sources)
            .field("user_agent", &self.user_agent)
            .field("bird_bin", &self.bird_bin)
            .field("tweets_per_poll", &self.tweets_per_poll)
            .field(
                "twitter_auth_token",
                &self.twitter_auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("twitter_ct0", &self.twitter_ct0.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
