mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hookwatch_core::{AppConfig, SourceKind, SourcesFile, WEBHOOK_URL_VAR};
use hookwatch_notify::{DeliverySink, Formatter, WebhookSink};
use hookwatch_sources::{FeedAdapter, SocialAdapter, SocialConfig};
use hookwatch_watch::{DiscoveryEngine, InMemoryWatermarks, Poller, PollerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hookwatch-server")]
#[command(about = "Relay new social posts and feed entries to a chat webhook")]
struct Cli {
    /// Delivery endpoint; overrides the environment.
    #[arg(long, env = WEBHOOK_URL_VAR, hide_env_values = true)]
    webhook: Option<String>,

    /// Path to the sources YAML file.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Run a single tick over every source, then exit.
    ///
    /// Checks that fetching works; never delivers. Watermarks start at the
    /// current time, so a fresh process treats everything fetched as seen.
    #[arg(long, conflicts_with = "check")]
    once: bool,

    /// Validate configuration and sources, print a summary, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let webhook = cli.webhook.clone();
    let mut config = hookwatch_core::build_app_config(|key| match &webhook {
        Some(url) if key == WEBHOOK_URL_VAR => Ok(url.clone()),
        _ => std::env::var(key),
    })?;
    if let Some(path) = cli.sources {
        config.sources_path = path;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sources = hookwatch_core::load_sources(&config.sources_path)?;
    let sink = WebhookSink::new(
        &config.webhook_url,
        config.delivery_timeout_secs,
        &config.user_agent,
    )?;

    if cli.check {
        print_summary(&config, &sources, &sink);
        return Ok(());
    }

    let poller = Arc::new(build_poller(&config, Arc::new(sink))?);

    if cli.once {
        let tick = poller.poll(&sources.sources()).await;
        tracing::info!(
            delivered = tick.delivered,
            failed = tick.failed,
            aborted = tick.aborted,
            "single tick finished"
        );
        return Ok(());
    }

    let groups = scheduler::poll_groups(&config, &sources);
    if groups.is_empty() {
        tracing::warn!(
            path = %config.sources_path.display(),
            "no sources configured; nothing to poll"
        );
    }
    let scheduler = scheduler::build_scheduler(Arc::clone(&poller), groups).await?;
    tracing::info!(env = %config.env, "hookwatch started");

    shutdown_signal().await;

    let grace = Duration::from_secs(config.fetch_timeout_secs + config.delivery_timeout_secs);
    scheduler.shutdown(grace).await?;
    Ok(())
}

fn build_poller(config: &AppConfig, sink: Arc<dyn DeliverySink>) -> anyhow::Result<Poller> {
    let feed = FeedAdapter::new(config.fetch_timeout_secs, &config.user_agent)?;
    let social = SocialAdapter::new(SocialConfig {
        bird_bin: config.bird_bin.clone(),
        auth_token: config.twitter_auth_token.clone(),
        ct0: config.twitter_ct0.clone(),
        count: config.tweets_per_poll,
    });
    if config.twitter_auth_token.is_none() || config.twitter_ct0.is_none() {
        tracing::warn!("TWITTER_AUTH_TOKEN/TWITTER_CT0 not set; account polls will fail");
    }

    let engine = DiscoveryEngine::new(Arc::new(InMemoryWatermarks::new()));
    let poller_config = PollerConfig {
        fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        delivery_timeout: Duration::from_secs(config.delivery_timeout_secs),
        max_concurrent_sources: config.max_concurrent_sources,
    };

    Ok(
        Poller::new(engine, Formatter::default(), sink, poller_config)
            .with_adapter(Arc::new(social))
            .with_adapter(Arc::new(feed)),
    )
}

fn print_summary(config: &AppConfig, sources: &SourcesFile, sink: &WebhookSink) {
    println!("environment:   {}", config.env);
    println!("webhook:       {}", sink.describe());
    println!("sources file:  {}", config.sources_path.display());
    for kind in [SourceKind::Social, SourceKind::Feed] {
        let group = sources.sources_of(kind);
        let cron = match kind {
            SourceKind::Social => &config.social_cron,
            SourceKind::Feed => &config.feed_cron,
        };
        println!("{kind} sources ({}), cron '{cron}':", group.len());
        for source in &group {
            println!("  - {} ({})", source.display_name(), source.key);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
