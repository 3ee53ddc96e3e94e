//! Per-source watermarks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::locks::KeyedLocks;

/// Wall-clock source, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Timestamp boundary per source: items at or before it count as delivered.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Current watermark for `key`. An unseen key starts at the current
    /// time, so content published before the process started is never
    /// delivered.
    async fn get(&self, key: &str) -> DateTime<Utc>;

    /// Raises the watermark to `candidate` if it is later than the stored
    /// value and returns the value stored afterwards. Never lowers it.
    async fn advance(&self, key: &str, candidate: DateTime<Utc>) -> DateTime<Utc>;
}

/// Process-lifetime watermarks, serialized per key.
pub struct InMemoryWatermarks {
    clock: Clock,
    marks: KeyedLocks<Option<DateTime<Utc>>>,
}

impl Default for InMemoryWatermarks {
    fn default() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }
}

impl InMemoryWatermarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            marks: KeyedLocks::new(),
        }
    }

    /// Stored watermark without initializing an unseen key.
    pub async fn peek(&self, key: &str) -> Option<DateTime<Utc>> {
        *self.marks.lock(key).await
    }
}

#[async_trait]
impl WatermarkStore for InMemoryWatermarks {
    async fn get(&self, key: &str) -> DateTime<Utc> {
        let mut mark = self.marks.lock(key).await;
        *mark.get_or_insert_with(|| (self.clock)())
    }

    async fn advance(&self, key: &str, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let mut mark = self.marks.lock(key).await;
        let current = *mark.get_or_insert_with(|| (self.clock)());
        if candidate > current {
            *mark = Some(candidate);
            candidate
        } else {
            current
        }
    }
}
