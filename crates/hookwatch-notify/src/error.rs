use thiserror::Error;

/// Delivery failures. Never retried by the sink itself.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("transport failure posting to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint {endpoint} rejected notification with HTTP {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl DeliveryError {
    /// HTTP status returned by the endpoint, if it answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            DeliveryError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            DeliveryError::Client(_) => None,
        }
    }
}
