//! Poll loop turning readings into push notifications.
//!
//! This module provides the [`Notifier`] that periodically captures a
//! [`Snapshot`], evaluates every subscriber's alert settings against it and
//! delivers the notifications that pass the cooldown and once gate.
//!
//! # Cycle
//!
//! ```text
//! capture snapshot → load subscribers → evaluate → gate → dispatch → commit
//! ```
//!
//! The store is the only record of what was sent. Gate decisions made during a
//! cycle are collected in the [`CycleContext`] and committed once at the end of
//! the cycle; when the commit fails they are kept and applied again on top of
//! the next load, so a dispatch is never forgotten.
//!
//! # Concurrency
//!
//! Subscribers are processed concurrently, up to `push.max_concurrent` at a
//! time. Each subscriber is exclusively borrowed by the future processing it, so
//! two evaluations of the same (subscriber, kind) can never both pass the gate.
//! A delivery that does not complete within `push.timeout` counts as failed.

use std::{fmt, panic::AssertUnwindSafe, pin::pin, time::Duration};

use futures::{FutureExt, StreamExt, future, stream};
use log::{debug, error, info, warn};
use tokio::{signal, time};

use crate::{
    alerts::{AlertKind, AlertState, compose, evaluate, should_notify, trigger},
    config::Config,
    push::{Delivery, Dispatcher},
    snapshot::{Snapshot, SnapshotRequester, SnapshotSync},
    subscribers::{PendingChanges, Subscriber, SubscriberStore},
    utils::epoch_now,
};

/// State carried from one poll cycle to the next.
#[derive(Debug, Default)]
pub struct CycleContext {
    /// Gate decisions and removals not yet written to the store
    pending: PendingChanges,
}

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    /// Subscribers evaluated
    pub subscribers: usize,
    /// Notifications that passed the gate
    pub fired: usize,
    /// Notifications accepted by the push service
    pub delivered: usize,
    /// Notifications that could not be delivered
    pub failed: usize,
    /// Subscribers dropped because their subscription expired
    pub removed: usize,
    /// The store could not be read and the cycle was skipped
    pub skipped: bool,
    /// Readings the cycle was evaluated against
    pub snapshot: Snapshot,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.skipped {
            return write!(f, "cycle skipped, subscribers unavailable");
        }
        write!(
            f,
            "{} subscribers, {} fired, {} delivered, {} failed, {} removed",
            self.subscribers, self.fired, self.delivered, self.failed, self.removed
        )
    }
}

/// Result of processing one subscriber.
#[derive(Debug, Default)]
struct SubscriberOutcome {
    endpoint: String,
    fired: usize,
    delivered: usize,
    failed: usize,
    /// The subscription expired
    gone: bool,
    /// States changed by the gate
    states: Vec<(AlertKind, AlertState)>,
}

/// Drives the poll loop.
///
/// # Examples
///
/// ```no_run
/// let notifier = Notifier::new(
///     SnapshotSync::new(BackendRequester::new(&config.backend.url, config.backend.timeout)?),
///     PushGateway::new(&config.push.url, config.push.timeout)?,
///     SubscriberStore::new(get_path(&data, SUBSCRIPTIONS_FILE)),
///     &config,
/// );
/// notifier.start().await; // Runs until Ctrl-C
/// ```
pub struct Notifier<R: SnapshotRequester, D: Dispatcher> {
    /// Source of the readings
    snapshot_sync: SnapshotSync<R>,
    /// Delivers notifications
    dispatcher: D,
    /// Durable subscribers and gate state
    store: SubscriberStore,
    /// Bound of one delivery
    dispatch_timeout: Duration,
    /// Subscribers processed at the same time
    max_concurrent: usize,
    /// Delay between two cycles
    interval: Duration,
    /// Delay after a failed cycle
    retry_delay: Duration,
}

impl<R: SnapshotRequester, D: Dispatcher> Notifier<R, D> {
    pub fn new(
        snapshot_sync: SnapshotSync<R>,
        dispatcher: D,
        store: SubscriberStore,
        config: &Config,
    ) -> Self {
        Notifier {
            snapshot_sync,
            dispatcher,
            store,
            dispatch_timeout: Duration::from_secs(config.push.timeout),
            max_concurrent: config.push.max_concurrent.max(1),
            interval: Duration::from_secs(config.polling.interval),
            retry_delay: Duration::from_secs(config.polling.retry_delay),
        }
    }

    /// Runs poll cycles until Ctrl-C.
    pub async fn start(self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for Ctrl-C: {}", e);
                future::pending::<()>().await;
            }
        };
        self.run_until(ctrl_c).await;
    }

    /// Runs poll cycles until `shutdown` completes.
    ///
    /// `shutdown` is polled from the start of the first cycle, so a request
    /// made at any time is seen. A cycle always runs to completion: a request
    /// made during a cycle stops the loop once it is committed.
    async fn run_until(self, shutdown: impl Future<Output = ()>) {
        info!(
            "polling every {}s, store {}",
            self.interval.as_secs(),
            self.store.path().display()
        );

        let mut shutdown = pin!(shutdown);
        let mut context = CycleContext::default();
        loop {
            let cycle = self.run_guarded(&mut context);
            let mut cycle = pin!(cycle);

            let delay = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested, finishing the current cycle");
                    cycle.await;
                    break;
                }
                delay = &mut cycle => delay,
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = time::sleep(delay) => {}
            }
        }

        info!("shutting down");
    }

    /// Runs one cycle, catching any error or panic, and returns the delay
    /// before the next one.
    async fn run_guarded(&self, context: &mut CycleContext) -> Duration {
        match AssertUnwindSafe(self.run_cycle(context)).catch_unwind().await {
            Ok(Ok(report)) if report.skipped => {
                warn!("{}", report);
                self.retry_delay
            }
            Ok(Ok(report)) => {
                info!("{}", report);
                self.interval
            }
            Ok(Err(e)) => {
                error!("poll cycle failed: {:#}", e);
                self.retry_delay
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("poll cycle panicked: {}", reason);
                self.retry_delay
            }
        }
    }

    /// Runs one poll cycle.
    pub async fn run_cycle(&self, context: &mut CycleContext) -> Result<CycleReport, anyhow::Error> {
        let now = epoch_now()?;
        self.run_cycle_at(context, now).await
    }

    async fn run_cycle_at(
        &self,
        context: &mut CycleContext,
        now: f64,
    ) -> Result<CycleReport, anyhow::Error> {
        let snapshot = self.snapshot_sync.capture().await;

        let mut subscribers = match self.store.load_all().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!("failed to load subscribers, skipping cycle: {}", e);
                return Ok(CycleReport {
                    skipped: true,
                    snapshot,
                    ..Default::default()
                });
            }
        };
        context.pending.apply_to(&mut subscribers);

        debug!("evaluating {} subscribers", subscribers.len());

        let outcomes: Vec<SubscriberOutcome> = stream::iter(subscribers.iter_mut())
            .map(|subscriber| self.process(subscriber, &snapshot, now))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut report = CycleReport {
            subscribers: subscribers.len(),
            ..Default::default()
        };
        let mut changes = PendingChanges::default();
        for outcome in outcomes {
            report.fired += outcome.fired;
            report.delivered += outcome.delivered;
            report.failed += outcome.failed;

            if outcome.gone {
                report.removed += 1;
                changes.record_removal(&outcome.endpoint);
                continue;
            }
            for (kind, state) in outcome.states {
                changes.record_state(&outcome.endpoint, kind, state);
            }
        }

        context.pending.merge(changes);
        if !context.pending.is_empty() {
            match self.store.commit(&context.pending).await {
                Ok(()) => context.pending.clear(),
                Err(e) => error!(
                    "failed to persist subscribers, keeping changes for the next cycle: {}",
                    e
                ),
            }
        }

        report.snapshot = snapshot;

        Ok(report)
    }

    /// Evaluates and gates every kind of one subscriber, delivering what fires.
    ///
    /// Stops at the first delivery reporting the subscription as expired.
    async fn process(
        &self,
        subscriber: &mut Subscriber,
        snapshot: &Snapshot,
        now: f64,
    ) -> SubscriberOutcome {
        let mut outcome = SubscriberOutcome {
            endpoint: subscriber.endpoint.clone(),
            ..Default::default()
        };

        for kind in AlertKind::ALL {
            let setting = subscriber.setting(kind);
            let observation = snapshot.observe(kind);
            let armed = evaluate(kind, &setting, observation);

            let state = subscriber.state.entry(kind).or_default();
            if !should_notify(&subscriber.endpoint, kind, armed, &setting, state, now) {
                continue;
            }
            outcome.fired += 1;
            outcome.states.push((kind, state.clone()));

            let Some(cause) = trigger(kind, &setting, observation) else {
                continue;
            };
            let notification = compose(&setting, &cause);

            let delivery = time::timeout(
                self.dispatch_timeout,
                self.dispatcher.send(&subscriber.subscription, &notification),
            )
            .await
            .unwrap_or_else(|_| Delivery::Failed("delivery timed out".to_owned()));

            match delivery {
                Delivery::Delivered => {
                    debug!("{} notification delivered to {}", kind, subscriber.endpoint);
                    outcome.delivered += 1;
                }
                Delivery::Failed(reason) => {
                    warn!(
                        "{} notification to {} failed: {}",
                        kind, subscriber.endpoint, reason
                    );
                    outcome.failed += 1;
                }
                Delivery::Gone => {
                    info!("dropping expired subscriber {}", subscriber.endpoint);
                    outcome.gone = true;
                    break;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        alerts::Notification,
        push::MockDispatcher,
        snapshot::{
            AuroraResponse, IndoorResponse, MockSnapshotRequester, OutdoorResponse,
            WarningsResponse,
        },
    };

    fn requester(eco2: Option<f64>, humidity: Option<f64>) -> MockSnapshotRequester {
        let mut mock_requester = MockSnapshotRequester::new();

        mock_requester
            .expect_get_outdoor()
            .returning(|| Err(anyhow::anyhow!("offline")));
        mock_requester.expect_get_indoor().returning(move || {
            Ok(IndoorResponse {
                eco2,
                humidity,
                ..Default::default()
            })
        });
        mock_requester.expect_get_aurora().returning(|| {
            Ok(AuroraResponse {
                probability: Some(5.0),
                kp_index: Some(2.0),
                ..Default::default()
            })
        });
        mock_requester
            .expect_get_official_warnings()
            .returning(|| Ok(WarningsResponse::default()));

        mock_requester
    }

    fn subscription(endpoint: &str) -> Value {
        json!({"endpoint": endpoint, "keys": {"p256dh": "key", "auth": "auth"}})
    }

    fn notifier(
        requester: MockSnapshotRequester,
        dispatcher: MockDispatcher,
        store: &SubscriberStore,
    ) -> Notifier<MockSnapshotRequester, MockDispatcher> {
        Notifier::new(
            SnapshotSync::new(requester),
            dispatcher,
            store.clone(),
            &Config::default(),
        )
    }

    fn endpoint_of(subscription: &Value) -> &str {
        subscription["endpoint"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_cooldown_across_cycles() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"co2": {"enabled": true, "threshold": 800, "cooldown": 3600, "once": false}})),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|_, notification| {
                notification.kind == AlertKind::Co2
                    && notification.body
                        == "Indoor CO₂ is 900 ppm (≥ 800 ppm). Open windows to ventilate."
            })
            .times(2)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(Some(900.0), None), dispatcher, &store);
        let mut context = CycleContext::default();

        let report = notifier.run_cycle_at(&mut context, 0.0).await.unwrap();
        assert_eq!(report.fired, 1);
        assert_eq!(report.delivered, 1);

        let subscribers = store.load_all().await.unwrap();
        assert_eq!(subscribers[0].state[&AlertKind::Co2].last_sent, Some(0.0));

        let report = notifier.run_cycle_at(&mut context, 1800.0).await.unwrap();
        assert_eq!(report.fired, 0);

        let report = notifier.run_cycle_at(&mut context, 3601.0).await.unwrap();
        assert_eq!(report.fired, 1);

        let subscribers = store.load_all().await.unwrap();
        assert_eq!(
            subscribers[0].state[&AlertKind::Co2].last_sent,
            Some(3601.0)
        );
    }

    #[tokio::test]
    async fn test_missing_reading_only_disarms_its_kind() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({
                    "co2": {"enabled": true, "threshold": 400},
                    "lowHumidity": {"enabled": true, "threshold": 30}
                })),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|_, notification| notification.kind == AlertKind::LowHumidity)
            .times(1)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(None, Some(25.0)), dispatcher, &store);
        let report = notifier
            .run_cycle_at(&mut CycleContext::default(), 1000.0)
            .await
            .unwrap();

        assert_eq!(report.fired, 1);
        assert!(report.snapshot.outdoor.is_none());
        let subscribers = store.load_all().await.unwrap();
        assert!(!subscribers[0].state.contains_key(&AlertKind::Co2));
    }

    #[tokio::test]
    async fn test_expired_subscription_is_removed() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        let settings = json!({
            "co2": {"enabled": true, "threshold": 400},
            "lowHumidity": {"enabled": true, "threshold": 30}
        });
        store
            .upsert(subscription("https://push.example/gone"), Some(settings.clone()))
            .await
            .unwrap();
        store
            .upsert(subscription("https://push.example/ok"), Some(settings))
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|subscription, _| endpoint_of(subscription) == "https://push.example/gone")
            .times(1)
            .returning(|_, _| Delivery::Gone);
        dispatcher
            .expect_send()
            .withf(|subscription, _| endpoint_of(subscription) == "https://push.example/ok")
            .times(2)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(Some(900.0), Some(25.0)), dispatcher, &store);
        let report = notifier
            .run_cycle_at(&mut CycleContext::default(), 1000.0)
            .await
            .unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.delivered, 2);

        let subscribers = store.load_all().await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].endpoint, "https://push.example/ok");
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_retried_before_cooldown() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"lowHumidity": {"enabled": true, "threshold": 30, "cooldown": 600}})),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_, _| Delivery::Failed("push gateway answered 503".to_owned()));

        let notifier = notifier(requester(None, Some(25.0)), dispatcher, &store);
        let mut context = CycleContext::default();

        let report = notifier.run_cycle_at(&mut context, 1000.0).await.unwrap();
        assert_eq!(report.failed, 1);

        let report = notifier.run_cycle_at(&mut context, 1010.0).await.unwrap();
        assert_eq!(report.fired, 0);

        let subscribers = store.load_all().await.unwrap();
        assert_eq!(
            subscribers[0].state[&AlertKind::LowHumidity].last_sent,
            Some(1000.0)
        );
    }

    #[tokio::test]
    async fn test_once_fires_a_single_time() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"co2": {"enabled": true, "threshold": 800, "cooldown": 0, "once": true}})),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(Some(1200.0), None), dispatcher, &store);
        let mut context = CycleContext::default();

        for now in [1000.0, 100_000.0, 10_000_000.0] {
            notifier.run_cycle_at(&mut context, now).await.unwrap();
        }

        let subscribers = store.load_all().await.unwrap();
        assert!(subscribers[0].state[&AlertKind::Co2].once_fired);
    }

    #[tokio::test]
    async fn test_unreadable_store_skips_cycle() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        std::fs::write(store.path(), "{ not json").unwrap();

        // Any delivery would fail the test
        let dispatcher = MockDispatcher::new();

        let notifier = notifier(requester(Some(1200.0), None), dispatcher, &store);
        let report = notifier
            .run_cycle_at(&mut CycleContext::default(), 1000.0)
            .await
            .unwrap();

        assert!(report.skipped);
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "{ not json"
        );
    }

    /// Requester whose outdoor source crashes.
    struct CrashingRequester;

    impl SnapshotRequester for CrashingRequester {
        async fn get_outdoor(&self) -> Result<OutdoorResponse, anyhow::Error> {
            panic!("sensor driver crashed")
        }

        async fn get_indoor(&self) -> Result<IndoorResponse, anyhow::Error> {
            Ok(IndoorResponse::default())
        }

        async fn get_aurora(&self) -> Result<AuroraResponse, anyhow::Error> {
            Ok(AuroraResponse::default())
        }

        async fn get_official_warnings(&self) -> Result<WarningsResponse, anyhow::Error> {
            Ok(WarningsResponse::default())
        }
    }

    #[tokio::test]
    async fn test_panicking_cycle_is_caught() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));

        let notifier = Notifier::new(
            SnapshotSync::new(CrashingRequester),
            MockDispatcher::new(),
            store,
            &Config::default(),
        );
        let delay = notifier.run_guarded(&mut CycleContext::default()).await;

        assert_eq!(delay, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_empty_store_completes_cycle() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));

        let notifier = notifier(requester(Some(1200.0), None), MockDispatcher::new(), &store);
        let delay = notifier.run_guarded(&mut CycleContext::default()).await;

        assert_eq!(delay, Duration::from_secs(300));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_failed_commit_is_retried_next_cycle() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"co2": {"enabled": true, "threshold": 800, "cooldown": 3600}})),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(Some(900.0), None), dispatcher, &store);
        let mut context = CycleContext::default();

        // The temporary file cannot be created over a directory
        let blocker = dir.path().join("subscriptions.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let report = notifier.run_cycle_at(&mut context, 0.0).await.unwrap();
        assert_eq!(report.fired, 1);
        let subscribers = store.load_all().await.unwrap();
        assert!(!subscribers[0].state.contains_key(&AlertKind::Co2));

        std::fs::remove_dir(&blocker).unwrap();

        let report = notifier.run_cycle_at(&mut context, 1800.0).await.unwrap();
        assert_eq!(report.fired, 0);
        let subscribers = store.load_all().await.unwrap();
        assert_eq!(subscribers[0].state[&AlertKind::Co2].last_sent, Some(0.0));
    }

    /// Dispatcher whose deliveries to one endpoint never complete.
    struct HangingDispatcher {
        hung_endpoint: &'static str,
    }

    impl Dispatcher for HangingDispatcher {
        async fn send(&self, subscription: &Value, _notification: &Notification) -> Delivery {
            if endpoint_of(subscription) == self.hung_endpoint {
                future::pending::<()>().await;
            }
            Delivery::Delivered
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_delivery_times_out() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        let settings = json!({"co2": {"enabled": true, "threshold": 800}});
        for endpoint in ["https://push.example/hung", "https://push.example/ok"] {
            store
                .upsert(subscription(endpoint), Some(settings.clone()))
                .await
                .unwrap();
        }

        let notifier = Notifier::new(
            SnapshotSync::new(requester(Some(900.0), None)),
            HangingDispatcher {
                hung_endpoint: "https://push.example/hung",
            },
            store.clone(),
            &Config::default(),
        );

        let started = time::Instant::now();
        let report = notifier
            .run_cycle_at(&mut CycleContext::default(), 1000.0)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(20));
        assert_eq!(report.fired, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);

        let subscribers = store.load_all().await.unwrap();
        for subscriber in &subscribers {
            assert_eq!(
                subscriber.state[&AlertKind::Co2].last_sent,
                Some(1000.0),
                "{}",
                subscriber.endpoint
            );
        }
    }

    #[tokio::test]
    async fn test_shutdown_before_first_cycle_lets_it_commit() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"co2": {"enabled": true, "threshold": 800}})),
            )
            .await
            .unwrap();

        let mut dispatcher = MockDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_, _| Delivery::Delivered);

        let notifier = notifier(requester(Some(900.0), None), dispatcher, &store);
        time::timeout(Duration::from_secs(5), notifier.run_until(future::ready(())))
            .await
            .unwrap();

        let subscribers = store.load_all().await.unwrap();
        assert!(subscribers[0].state[&AlertKind::Co2].last_sent.is_some());
    }

    #[tokio::test]
    async fn test_shutdown_during_cycle_stops_after_commit() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));
        store
            .upsert(
                subscription("https://push.example/1"),
                Some(json!({"lowHumidity": {"enabled": true, "threshold": 30}})),
            )
            .await
            .unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let mut shutdown_tx = Some(shutdown_tx);
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_send().times(1).returning(move |_, _| {
            // Ctrl-C while the delivery is in flight
            if let Some(tx) = shutdown_tx.take() {
                tx.send(()).unwrap();
            }
            Delivery::Delivered
        });

        let notifier = notifier(requester(None, Some(20.0)), dispatcher, &store);
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        time::timeout(Duration::from_secs(5), notifier.run_until(shutdown))
            .await
            .unwrap();

        let subscribers = store.load_all().await.unwrap();
        assert!(subscribers[0].state[&AlertKind::LowHumidity].last_sent.is_some());
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_stops_loop() {
        let dir = TempDir::new().unwrap();
        let store = SubscriberStore::new(dir.path().join("subscriptions.json"));

        let notifier = notifier(requester(None, None), MockDispatcher::new(), &store);
        let shutdown = time::sleep(Duration::from_millis(200));

        // The next cycle is due in 300s
        time::timeout(Duration::from_secs(5), notifier.run_until(shutdown))
            .await
            .unwrap();
    }

    #[test]
    fn test_report_display() {
        let report = CycleReport {
            subscribers: 3,
            fired: 2,
            delivered: 1,
            failed: 0,
            removed: 1,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "3 subscribers, 2 fired, 1 delivered, 0 failed, 1 removed"
        );
    }
}
