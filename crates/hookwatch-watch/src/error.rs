use hookwatch_core::SourceKind;
use hookwatch_sources::SourceError;
use thiserror::Error;

/// Reasons a source's pipeline was abandoned for a tick. The watermark is
/// untouched in every case, so the next tick retries from the same boundary.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("previous poll of this source is still in flight")]
    Busy,

    #[error("no adapter registered for {0} sources")]
    NoAdapter(SourceKind),

    #[error("fetch timed out after {secs}s")]
    FetchTimeout { secs: u64 },

    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),
}
