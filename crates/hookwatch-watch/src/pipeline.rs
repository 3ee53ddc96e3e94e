//! Per-tick pipeline: fetch → discover → format → deliver, for each source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use hookwatch_core::{Source, SourceKind};
use hookwatch_notify::{DeliverySink, Formatter};
use hookwatch_sources::SourceAdapter;

use crate::discovery::DiscoveryEngine;
use crate::error::PollError;
use crate::locks::KeyedLocks;
use crate::report::{SourceReport, TickReport};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
    pub max_concurrent_sources: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(10),
            max_concurrent_sources: 4,
        }
    }
}

/// Runs poll ticks over a set of sources.
///
/// Sources are independent: one failing never blocks another. Within a
/// source the steps are strictly sequential, and at most one pipeline per
/// source key runs at a time.
pub struct Poller {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    engine: DiscoveryEngine,
    formatter: Formatter,
    sink: Arc<dyn DeliverySink>,
    config: PollerConfig,
    in_flight: KeyedLocks<()>,
    shutting_down: AtomicBool,
}

impl Poller {
    #[must_use]
    pub fn new(
        engine: DiscoveryEngine,
        formatter: Formatter,
        sink: Arc<dyn DeliverySink>,
        config: PollerConfig,
    ) -> Self {
        Self {
            adapters: HashMap::new(),
            engine,
            formatter,
            sink,
            config,
            in_flight: KeyedLocks::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Registers the adapter used for sources of `adapter.kind()`.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Stop starting new deliveries. A delivery already in flight finishes.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Poll every source once, up to `max_concurrent_sources` at a time.
    pub async fn poll(&self, sources: &[Source]) -> TickReport {
        let max_concurrent = self.config.max_concurrent_sources.max(1);

        let polls: Vec<_> = sources
            .iter()
            .map(|source| async move { (source, self.poll_source(source).await) })
            .collect();
        let results: Vec<(&Source, Result<SourceReport, PollError>)> = stream::iter(polls)
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        let mut tick = TickReport {
            sources: sources.len(),
            ..TickReport::default()
        };
        for (source, result) in &results {
            match result {
                Ok(report) => tick.record(report),
                Err(PollError::Busy) => {
                    tick.skipped += 1;
                    tracing::warn!(
                        source = %source.key,
                        "previous poll still running; skipping source this tick"
                    );
                }
                Err(e) => {
                    tick.aborted += 1;
                    tracing::warn!(
                        source = %source.key,
                        kind = %source.kind,
                        error = %e,
                        "poll aborted; watermark untouched"
                    );
                }
            }
        }

        tracing::info!(
            sources = tick.sources,
            polled = tick.polled,
            aborted = tick.aborted,
            skipped = tick.skipped,
            discovered = tick.discovered,
            delivered = tick.delivered,
            failed = tick.failed,
            dropped = tick.dropped,
            "poll tick complete"
        );
        tick
    }

    /// Run the full pipeline for one source.
    ///
    /// The watermark advances as soon as discovery succeeds, before any
    /// delivery. A failed delivery is logged and counted but the item is not
    /// offered again on a later tick.
    ///
    /// # Errors
    ///
    /// Returns [`PollError`] when the source is already being polled, has
    /// no adapter, or its fetch fails or times out. The watermark is
    /// untouched in all of those cases.
    pub async fn poll_source(&self, source: &Source) -> Result<SourceReport, PollError> {
        let _in_flight = self.in_flight.try_lock(&source.key).ok_or(PollError::Busy)?;

        let adapter = self
            .adapters
            .get(&source.kind)
            .ok_or(PollError::NoAdapter(source.kind))?;

        let since = self.engine.watermark(&source.key).await;
        tracing::info!(
            source = %source.key,
            kind = %source.kind,
            since = %since.to_rfc2822(),
            "polling source"
        );

        let fetched = tokio::time::timeout(self.config.fetch_timeout, adapter.fetch(source))
            .await
            .map_err(|_| PollError::FetchTimeout {
                secs: self.config.fetch_timeout.as_secs(),
            })??;

        let source = match &fetched.profile {
            Some(profile) => source.with_profile(profile),
            None => source.clone(),
        };
        let fetched_count = fetched.items.len();
        let discovery = self.engine.discover(&source.key, fetched.items).await;

        let mut report = SourceReport {
            key: source.key.clone(),
            fetched: fetched_count,
            discovered: discovery.new_items.len(),
            delivered: 0,
            failed: 0,
            dropped: 0,
            watermark: discovery.watermark,
        };

        for (index, item) in discovery.new_items.iter().enumerate() {
            if self.is_shutting_down() {
                report.dropped = discovery.new_items.len() - index;
                tracing::warn!(
                    source = %source.key,
                    dropped = report.dropped,
                    "shutdown in progress; abandoning remaining deliveries"
                );
                break;
            }

            let payload = self.formatter.format(item, &source);
            tracing::info!(
                source = %source.key,
                title = %payload.title,
                link = %payload.link,
                published = %item.published.to_rfc2822(),
                "new item"
            );

            match tokio::time::timeout(self.config.delivery_timeout, self.sink.deliver(&payload))
                .await
            {
                Ok(Ok(ack)) => {
                    report.delivered += 1;
                    tracing::debug!(
                        source = %source.key,
                        status = ack.status,
                        message_id = ?ack.message_id,
                        "notification delivered"
                    );
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::error!(
                        source = %source.key,
                        status = ?e.status(),
                        error = %e,
                        "notification delivery failed"
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::error!(
                        source = %source.key,
                        endpoint = %self.sink.describe(),
                        timeout_secs = self.config.delivery_timeout.as_secs(),
                        "notification delivery timed out"
                    );
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
