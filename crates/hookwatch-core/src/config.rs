use reqwest::Url;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Environment variable holding the delivery endpoint.
pub const WEBHOOK_URL_VAR: &str = "HOOKWATCH_WEBHOOK_URL";

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup, or layered over CLI overrides.
///
/// # Errors
///
/// Returns `ConfigError` if required vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_positive_u64(var, default)?;
        usize::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_positive_u64(var, default)?;
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let raw_webhook = lookup(WEBHOOK_URL_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(WEBHOOK_URL_VAR.to_string()))?;
    let webhook_url = parse_webhook_url(&raw_webhook)?;

    let env = parse_environment(&or_default("HOOKWATCH_ENV", "development"))?;
    let log_level = or_default("HOOKWATCH_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "HOOKWATCH_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let social_cron = or_default("HOOKWATCH_SOCIAL_CRON", "0 * * * * *");
    let feed_cron = or_default("HOOKWATCH_FEED_CRON", "0 * * * * *");

    let fetch_timeout_secs = parse_positive_u64("HOOKWATCH_FETCH_TIMEOUT_SECS", "30")?;
    let delivery_timeout_secs = parse_positive_u64("HOOKWATCH_DELIVERY_TIMEOUT_SECS", "10")?;
    let max_concurrent_sources = parse_positive_usize("HOOKWATCH_MAX_CONCURRENT_SOURCES", "4")?;
    let user_agent = or_default("HOOKWATCH_USER_AGENT", "hookwatch/0.1 (feed-relay)");
    let bird_bin = or_default("HOOKWATCH_BIRD_BIN", "bird");
    let tweets_per_poll = parse_positive_u32("HOOKWATCH_TWEETS_PER_POLL", "20")?;

    Ok(AppConfig {
        env,
        log_level,
        webhook_url,
        sources_path,
        social_cron,
        feed_cron,
        fetch_timeout_secs,
        delivery_timeout_secs,
        max_concurrent_sources,
        user_agent,
        bird_bin,
        tweets_per_poll,
        twitter_auth_token: optional("TWITTER_AUTH_TOKEN"),
        twitter_ct0: optional("TWITTER_CT0"),
    })
}

/// Parse and validate the delivery endpoint.
///
/// The endpoint must be an absolute `http` or `https` URL with a host.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] naming `HOOKWATCH_WEBHOOK_URL` when
/// the value is malformed.
pub fn parse_webhook_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: WEBHOOK_URL_VAR.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}'; expected http or https",
            url.scheme()
        )));
    }
    if !url.host_str().is_some_and(|h| !h.is_empty()) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Parse a string into an `Environment` variant.
///
/// Returns an error for unrecognized values to catch typos like `"producton"`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HOOKWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
