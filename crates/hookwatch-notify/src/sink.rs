//! Webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::DeliveryError;
use crate::payload::NotificationPayload;

/// Longest response body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

/// Successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    /// Id of the created message, when the endpoint reports one.
    pub message_id: Option<String>,
}

/// Destination for formatted notifications.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Send one payload. Exactly one attempt is made.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] on transport failure or a non-2xx answer.
    async fn deliver(&self, payload: &NotificationPayload) -> Result<Ack, DeliveryError>;

    /// Endpoint description safe to put in logs.
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct CreatedMessage {
    id: Option<String>,
}

/// Posts notifications as JSON to a single webhook URL.
pub struct WebhookSink {
    client: Client,
    endpoint: Url,
}

impl WebhookSink {
    /// Creates a sink for `endpoint`.
    ///
    /// Adds `wait=true` to the query string (replacing any existing `wait`)
    /// so the endpoint acknowledges synchronously; other query parameters
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] if the `reqwest::Client` cannot be built.
    pub fn new(endpoint: &Url, timeout_secs: u64, user_agent: &str) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: with_wait(endpoint),
        })
    }

}

#[async_trait]
impl DeliverySink for WebhookSink {
    async fn deliver(&self, payload: &NotificationPayload) -> Result<Ack, DeliveryError> {
        let message = payload.to_webhook_message();
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&message)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                endpoint: self.describe(),
                source: e.without_url(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                endpoint: self.describe(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let message_id = serde_json::from_str::<CreatedMessage>(&body)
            .ok()
            .and_then(|m| m.id);
        Ok(Ack {
            status: status.as_u16(),
            message_id,
        })
    }

    fn describe(&self) -> String {
        redact(&self.endpoint)
    }
}

fn with_wait(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    let kept: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(k, _)| k != "wait")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("wait", "true");
    }
    url
}

/// Scheme, host and path with the final path segment (the webhook token)
/// masked and the query dropped.
fn redact(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() > 1 {
        segments.pop();
        segments.push("***");
    }
    format!("{}://{host}{port}/{}", url.scheme(), segments.join("/"))
}
