use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use hookwatch_core::{Item, SourceProfile};
use hookwatch_notify::{Ack, DeliveryError, NotificationPayload};
use hookwatch_sources::{Fetched, SourceError};

use super::*;
use crate::watermark::{InMemoryWatermarks, WatermarkStore};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
}

fn after(minutes: i64) -> DateTime<Utc> {
    start() + ChronoDuration::minutes(minutes)
}

/// Adapter that replays scripted fetch results, one per call.
struct ScriptedAdapter {
    kind: SourceKind,
    script: Mutex<VecDeque<Result<Fetched, SourceError>>>,
    delay: Option<Duration>,
}

impl ScriptedAdapter {
    fn new(kind: SourceKind, script: Vec<Result<Fetched, SourceError>>) -> Self {
        Self {
            kind,
            script: Mutex::new(script.into()),
            delay: None,
        }
    }

    fn slow(kind: SourceKind, delay: Duration) -> Self {
        Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, _source: &Source) -> Result<Fetched, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Fetched::default()))
    }
}

/// Adapter that serves items keyed by source, every call.
struct PerSourceAdapter {
    kind: SourceKind,
    items: HashMap<String, Result<Vec<Item>, ()>>,
}

#[async_trait]
impl SourceAdapter for PerSourceAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, source: &Source) -> Result<Fetched, SourceError> {
        match self.items.get(&source.key) {
            Some(Ok(items)) => Ok(Fetched {
                items: items.clone(),
                profile: None,
            }),
            _ => Err(SourceError::UnexpectedStatus {
                status: 502,
                url: source.key.clone(),
            }),
        }
    }
}

/// Sink that records payloads and answers with a fixed status.
struct RecordingSink {
    status: u16,
    sent: Mutex<Vec<NotificationPayload>>,
}

impl RecordingSink {
    fn answering(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, payload: &NotificationPayload) -> Result<Ack, DeliveryError> {
        self.sent.lock().unwrap().push(payload.clone());
        if (200..300).contains(&self.status) {
            Ok(Ack {
                status: self.status,
                message_id: None,
            })
        } else {
            Err(DeliveryError::Rejected {
                endpoint: self.describe(),
                status: self.status,
                body: "nope".to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        "recording://sink".to_string()
    }
}

fn store() -> Arc<InMemoryWatermarks> {
    Arc::new(InMemoryWatermarks::with_clock(Arc::new(start)))
}

fn poller(
    store: &Arc<InMemoryWatermarks>,
    sink: &Arc<RecordingSink>,
    adapter: Arc<dyn SourceAdapter>,
    config: PollerConfig,
) -> Poller {
    let store: Arc<dyn WatermarkStore> = Arc::clone(store) as Arc<dyn WatermarkStore>;
    let sink: Arc<dyn DeliverySink> = Arc::clone(sink) as Arc<dyn DeliverySink>;
    Poller::new(DiscoveryEngine::new(store), Formatter::default(), sink, config)
        .with_adapter(adapter)
}

fn bbc() -> Source {
    Source::social("BBCBweaking", None, None)
}

fn batch(items: Vec<Item>) -> Result<Fetched, SourceError> {
    Ok(Fetched {
        items,
        profile: None,
    })
}

#[tokio::test]
async fn first_tick_ignores_content_published_before_start() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![batch(vec![Item::new("old news", after(-5))])],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let report = poller.poll_source(&bbc()).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.discovered, 0);
    assert_eq!(report.watermark, start());
    assert!(sink.titles().is_empty());
}

#[tokio::test]
async fn new_items_are_delivered_oldest_first_and_watermark_advances() {
    let store = store();
    let sink = RecordingSink::answering(200);
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![batch(vec![
            Item::new("second", after(2)),
            Item::new("first", after(1)),
            Item::new("before start", after(-1)),
        ])],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let report = poller.poll_source(&bbc()).await.unwrap();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(sink.titles(), vec!["first", "second"]);
    assert_eq!(store.peek("BBCBweaking").await, Some(after(2)));
}

#[tokio::test]
async fn same_items_on_next_tick_are_not_redelivered() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let items = vec![Item::new("only once", after(1))];
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![batch(items.clone()), batch(items)],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    poller.poll_source(&bbc()).await.unwrap();
    let second = poller.poll_source(&bbc()).await.unwrap();

    assert_eq!(second.discovered, 0);
    assert_eq!(sink.titles(), vec!["only once"]);
}

#[tokio::test]
async fn fetch_failure_leaves_watermark_and_next_tick_retries_from_it() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![
            batch(vec![Item::new("a", after(1))]),
            Err(SourceError::MissingCredentials("nope".to_string())),
            batch(vec![Item::new("a", after(1)), Item::new("b", after(3))]),
        ],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    poller.poll_source(&bbc()).await.unwrap();
    let failed = poller.poll_source(&bbc()).await;
    assert!(matches!(failed, Err(PollError::Fetch(_))));
    assert_eq!(store.peek("BBCBweaking").await, Some(after(1)));

    let third = poller.poll_source(&bbc()).await.unwrap();
    assert_eq!(third.discovered, 1);
    assert_eq!(sink.titles(), vec!["a", "b"]);
}

#[tokio::test]
async fn delivery_failure_is_counted_and_watermark_still_advances() {
    let store = store();
    let sink = RecordingSink::answering(500);
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![batch(vec![Item::new("lost", after(1))])],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let report = poller.poll_source(&bbc()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 0);
    assert_eq!(store.peek("BBCBweaking").await, Some(after(1)));
}

#[tokio::test]
async fn fetch_timeout_aborts_without_touching_watermark() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::slow(SourceKind::Social, Duration::from_secs(5));
    let config = PollerConfig {
        fetch_timeout: Duration::from_millis(20),
        ..PollerConfig::default()
    };
    let poller = poller(&store, &sink, Arc::new(adapter), config);

    let result = poller.poll_source(&bbc()).await;

    assert!(matches!(result, Err(PollError::FetchTimeout { .. })));
    assert_eq!(store.peek("BBCBweaking").await, Some(start()));
}

#[tokio::test]
async fn source_already_in_flight_is_skipped() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(SourceKind::Social, vec![]);
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let _held = poller.in_flight.try_lock("BBCBweaking").unwrap();
    let result = poller.poll_source(&bbc()).await;

    assert!(matches!(result, Err(PollError::Busy)));
}

#[tokio::test]
async fn source_without_adapter_is_rejected() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(SourceKind::Social, vec![]);
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let feed = Source::feed("https://a.test/rss", None, None);
    let result = poller.poll_source(&feed).await;

    assert!(matches!(result, Err(PollError::NoAdapter(SourceKind::Feed))));
}

#[tokio::test]
async fn shutdown_drops_pending_deliveries() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(
        SourceKind::Social,
        vec![batch(vec![Item::new("a", after(1)), Item::new("b", after(2))])],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    poller.shutdown();
    let report = poller.poll_source(&bbc()).await.unwrap();

    assert!(poller.is_shutting_down());
    assert_eq!(report.dropped, 2);
    assert_eq!(report.delivered, 0);
    assert!(sink.titles().is_empty());
}

#[tokio::test]
async fn feed_profile_fills_sender_metadata() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let adapter = ScriptedAdapter::new(
        SourceKind::Feed,
        vec![Ok(Fetched {
            items: vec![Item::new("body", after(1)).with_title("Headline")],
            profile: Some(SourceProfile {
                name: Some("DutchNews.nl".to_string()),
                icon_url: Some("https://a.test/logo.png".to_string()),
                home_url: Some("https://a.test/".to_string()),
            }),
        })],
    );
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    poller
        .poll_source(&Source::feed("https://a.test/rss", None, None))
        .await
        .unwrap();

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender_name, "DutchNews.nl");
    assert_eq!(sent[0].lead, "New post by DutchNews.nl!");
    assert_eq!(sent[0].sender_icon.as_deref(), Some("https://a.test/logo.png"));
    assert_eq!(sent[0].author_url, "https://a.test/");
}

#[tokio::test]
async fn one_failing_source_does_not_block_the_others() {
    let store = store();
    let sink = RecordingSink::answering(204);
    let mut items = HashMap::new();
    items.insert("good".to_string(), Ok(vec![Item::new("hello", after(1))]));
    items.insert("bad".to_string(), Err(()));
    let adapter = PerSourceAdapter {
        kind: SourceKind::Social,
        items,
    };
    let poller = poller(&store, &sink, Arc::new(adapter), PollerConfig::default());

    let sources = vec![
        Source::social("bad", None, None),
        Source::social("good", None, None),
    ];
    let tick = poller.poll(&sources).await;

    assert_eq!(tick.sources, 2);
    assert_eq!(tick.polled, 1);
    assert_eq!(tick.aborted, 1);
    assert_eq!(tick.delivered, 1);
    assert_eq!(sink.titles(), vec!["hello"]);
    assert_eq!(store.peek("bad").await, Some(start()));
}
