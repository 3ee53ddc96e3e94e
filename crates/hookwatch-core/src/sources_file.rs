use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::source::{Source, SourceKind};
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub handle: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    pub name: Option<String>,
    pub icon: Option<String>,
}

/// Parsed contents of the sources YAML file.
#[derive(Debug, Default, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

impl SourcesFile {
    /// All configured sources, accounts first.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        let accounts = self
            .accounts
            .iter()
            .map(|a| Source::social(&a.handle, a.name.clone(), a.avatar.clone()));
        let feeds = self
            .feeds
            .iter()
            .map(|f| Source::feed(&f.url, f.name.clone(), f.icon.clone()));
        accounts.chain(feeds).collect()
    }

    /// Configured sources of one kind.
    #[must_use]
    pub fn sources_of(&self, kind: SourceKind) -> Vec<Source> {
        self.sources()
            .into_iter()
            .filter(|s| s.kind == kind)
            .collect()
    }
}

/// Load and validate the sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sources(&content)
}

/// Parse and validate sources YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let sources_file: SourcesFile = serde_yaml::from_str(content)?;
    validate_sources(&sources_file)?;
    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_handles = HashSet::new();
    for account in &sources_file.accounts {
        let handle = account.handle.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(ConfigError::Validation(
                "account handle must be non-empty".to_string(),
            ));
        }
        if handle.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "account handle '{handle}' must not contain whitespace"
            )));
        }
        if !seen_handles.insert(handle.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate account handle: '{handle}'"
            )));
        }
    }

    let mut seen_urls = HashSet::new();
    for feed in &sources_file.feeds {
        let url = feed.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "feed url must be non-empty".to_string(),
            ));
        }
        let parsed = reqwest::Url::parse(url).map_err(|e| {
            ConfigError::Validation(format!("feed url '{url}' is not a valid URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "feed url '{url}' must use http or https"
            )));
        }
        if !seen_urls.insert(url.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate feed url: '{url}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_file_test.rs"]
mod tests;
