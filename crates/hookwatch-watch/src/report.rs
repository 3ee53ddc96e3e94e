use chrono::{DateTime, Utc};

/// What happened to one source during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub key: String,
    pub fetched: usize,
    pub discovered: usize,
    pub delivered: usize,
    pub failed: usize,
    /// New items abandoned because shutdown began mid-tick.
    pub dropped: usize,
    pub watermark: DateTime<Utc>,
}

/// Totals for one tick across all sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sources: usize,
    /// Sources whose fetch and discovery completed.
    pub polled: usize,
    /// Sources abandoned because of a fetch error or timeout.
    pub aborted: usize,
    /// Sources skipped because their previous tick was still running.
    pub skipped: usize,
    pub discovered: usize,
    pub delivered: usize,
    pub failed: usize,
    pub dropped: usize,
}

impl TickReport {
    pub(crate) fn record(&mut self, report: &SourceReport) {
        self.polled += 1;
        self.discovered += report.discovered;
        self.delivered += report.delivered;
        self.failed += report.failed;
        self.dropped += report.dropped;
    }
}
