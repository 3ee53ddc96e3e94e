//! Decides which fetched items are new for a source.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hookwatch_core::Item;

use crate::locks::KeyedLocks;
use crate::watermark::WatermarkStore;

/// Outcome of one discovery pass.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Items published strictly after the prior watermark, oldest first.
    pub new_items: Vec<Item>,
    /// Watermark before this pass.
    pub previous: DateTime<Utc>,
    /// Watermark stored after this pass.
    pub watermark: DateTime<Utc>,
}

/// Partitions fetched items against the source watermark and advances it.
pub struct DiscoveryEngine {
    store: Arc<dyn WatermarkStore>,
    sequences: KeyedLocks<()>,
}

impl DiscoveryEngine {
    #[must_use]
    pub fn new(store: Arc<dyn WatermarkStore>) -> Self {
        Self {
            store,
            sequences: KeyedLocks::new(),
        }
    }

    /// Current watermark for `key`, initializing it if unseen.
    pub async fn watermark(&self, key: &str) -> DateTime<Utc> {
        self.store.get(key).await
    }

    /// Select the items of `key` newer than its watermark and advance the
    /// watermark to the newest of them.
    ///
    /// An item stamped exactly at the watermark counts as already seen.
    /// With no new items the watermark is left as is. The read, partition
    /// and advance run as one sequence per key, so overlapping calls for
    /// the same source cannot both claim an item.
    pub async fn discover(&self, key: &str, items: Vec<Item>) -> Discovery {
        let _sequence = self.sequences.lock(key).await;

        let previous = self.store.get(key).await;
        let mut new_items: Vec<Item> = items
            .into_iter()
            .filter(|item| item.published > previous)
            .collect();
        new_items.sort_by_key(|item| item.published);

        let watermark = match new_items.last() {
            Some(newest) => self.store.advance(key, newest.published).await,
            None => previous,
        };

        Discovery {
            new_items,
            previous,
            watermark,
        }
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
