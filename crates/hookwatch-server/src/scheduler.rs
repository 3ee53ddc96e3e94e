//! Cron registration of poll groups.
//!
//! Accounts and feeds are polled by separate jobs, each on its own cron
//! expression (six fields, seconds first).

use std::sync::Arc;
use std::time::Duration;

use hookwatch_core::{AppConfig, Source, SourceKind, SourcesFile};
use hookwatch_watch::Poller;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Sources of one kind polled together on one schedule.
#[derive(Debug, Clone)]
pub struct PollGroup {
    pub kind: SourceKind,
    pub cron: String,
    pub sources: Arc<[Source]>,
}

/// Split the configured sources into poll groups, skipping empty ones.
#[must_use]
pub fn poll_groups(config: &AppConfig, sources: &SourcesFile) -> Vec<PollGroup> {
    [
        (SourceKind::Social, &config.social_cron),
        (SourceKind::Feed, &config.feed_cron),
    ]
    .into_iter()
    .filter_map(|(kind, cron)| {
        let group = sources.sources_of(kind);
        (!group.is_empty()).then(|| PollGroup {
            kind,
            cron: cron.clone(),
            sources: group.into(),
        })
    })
    .collect()
}

/// A running scheduler plus what it needs to stop cleanly.
pub struct PollScheduler {
    scheduler: JobScheduler,
    poller: Arc<Poller>,
    /// Held for reading by every running tick.
    ticks: Arc<RwLock<()>>,
}

/// Registers one job per poll group and starts the scheduler.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, a
/// cron expression does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    poller: Arc<Poller>,
    groups: Vec<PollGroup>,
) -> Result<PollScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let ticks = Arc::new(RwLock::new(()));

    for group in groups {
        register_poll_job(&scheduler, Arc::clone(&poller), Arc::clone(&ticks), group).await?;
    }

    scheduler.start().await?;
    Ok(PollScheduler {
        scheduler,
        poller,
        ticks,
    })
}

async fn register_poll_job(
    scheduler: &JobScheduler,
    poller: Arc<Poller>,
    ticks: Arc<RwLock<()>>,
    group: PollGroup,
) -> Result<(), JobSchedulerError> {
    let kind = group.kind;
    let count = group.sources.len();
    let sources = Arc::clone(&group.sources);

    let job = Job::new_async(group.cron.as_str(), move |_uuid, _lock| {
        let poller = Arc::clone(&poller);
        let ticks = Arc::clone(&ticks);
        let sources = Arc::clone(&sources);

        Box::pin(async move {
            if poller.is_shutting_down() {
                return;
            }
            let _tick = ticks.read().await;
            tracing::debug!(kind = %kind, "scheduler: starting poll tick");
            poller.poll(&sources).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        kind = %kind,
        cron = %group.cron,
        sources = count,
        "scheduler: registered poll job"
    );
    Ok(())
}

impl PollScheduler {
    /// Stop scheduling ticks, then wait up to `grace` for running ones.
    ///
    /// Deliveries not yet started when shutdown begins are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler fails to shut down.
    pub async fn shutdown(mut self, grace: Duration) -> Result<(), JobSchedulerError> {
        self.poller.shutdown();
        self.scheduler.shutdown().await?;

        match tokio::time::timeout(grace, self.ticks.write()).await {
            Ok(_) => tracing::info!("scheduler: all poll ticks finished"),
            Err(_) => tracing::warn!(
                grace_secs = grace.as_secs(),
                "scheduler: poll ticks still running after grace period; exiting anyway"
            ),
        }
        Ok(())
    }
}
