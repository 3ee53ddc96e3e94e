//! Source adapters: fetch the current items of one configured source.
//!
//! Each adapter turns a live origin into a finite batch of [`Item`]s with
//! parsed publish timestamps, or fails. Deciding which items are new is not
//! their concern.

pub mod error;
pub mod feed;
pub mod social;

use async_trait::async_trait;
use hookwatch_core::{Item, Source, SourceKind, SourceProfile};

pub use error::SourceError;
pub use feed::FeedAdapter;
pub use social::{SocialAdapter, SocialConfig};

/// Result of one successful fetch.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub items: Vec<Item>,
    /// Metadata the origin reported about itself, if any.
    pub profile: Option<SourceProfile>,
}

/// Retrieval client for one kind of source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The kind of source this adapter handles.
    fn kind(&self) -> SourceKind;

    /// Fetch the items currently published by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the origin is unreachable or answers with
    /// something that cannot be parsed.
    async fn fetch(&self, source: &Source) -> Result<Fetched, SourceError>;
}
