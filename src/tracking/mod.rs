//! The activity sampling loop. Every second it asks the [WindowObserver] what is focused,
//! feeds the answer to the [SessionAggregator] (which writes finished sessions to the
//! [ActivityLog]) and to the [UnproductiveAlertTracker].

pub mod alert;
pub mod classifier;
pub mod session;

use std::{sync::Arc, time::Duration};

use alert::{alert_message, UnproductiveAlertTracker, ALERT_TITLE};
use anyhow::Result;
use classifier::Classifier;
use session::SessionAggregator;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    config::Config,
    listener::{FocusListener, NoopListener},
    notify::{LogNotifier, Notifier, NOTIFICATION_TIMEOUT},
    storage::{
        activity_log::ActivityLog,
        entities::{ActivityRecord, Classification},
    },
    utils::clock::Clock,
    window_api::{ActiveWindowData, WindowObserver},
};

pub const COLLECTION_INTERVAL: Duration = Duration::from_secs(1);

/// How long [TrackingHandle::stop_tracking] waits for the loop to wind down.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// What the user is looking at, as last sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentActivity {
    pub app_name: Arc<str>,
    pub window_title: Arc<str>,
    pub classification: Classification,
}

pub struct ActivityTracker<L: ActivityLog> {
    observer: Box<dyn WindowObserver>,
    classifier: Arc<Classifier>,
    sessions: SessionAggregator,
    alerts: UnproductiveAlertTracker,
    log: L,
    listener: Arc<dyn FocusListener>,
    notifier: Arc<dyn Notifier>,
    clock: Box<dyn Clock>,
    current: watch::Sender<Option<CurrentActivity>>,
}

impl<L: ActivityLog> ActivityTracker<L> {
    pub fn new(
        observer: Box<dyn WindowObserver>,
        config: &Config,
        log: L,
        clock: Box<dyn Clock>,
    ) -> Self {
        let classifier = Arc::new(Classifier::new(config));
        let (current, _) = watch::channel(None);
        Self {
            observer,
            sessions: SessionAggregator::new(classifier.clone()),
            classifier,
            alerts: UnproductiveAlertTracker::new(config.unproductive_threshold()),
            log,
            listener: Arc::new(NoopListener),
            notifier: Arc::new(LogNotifier),
            clock,
            current,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn FocusListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Live view of the last sampled activity.
    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentActivity>> {
        self.current.subscribe()
    }

    fn classify(&self, window: &ActiveWindowData) -> Classification {
        match &*self.current.borrow() {
            Some(current)
                if current.app_name == window.process_name
                    && current.window_title == window.window_title =>
            {
                current.classification
            }
            _ => self
                .classifier
                .classify(&window.process_name, &window.window_title),
        }
    }

    /// Takes one sample. Failing to read the active window skips the sample entirely.
    pub async fn sample(&mut self) {
        let window = match self.observer.get_active_window_info() {
            Ok(window) if !window.process_name.is_empty() => window,
            Ok(_) => {
                debug!("Active window has no process, skipping");
                return;
            }
            Err(e) => {
                warn!("No active window this tick {e:?}");
                return;
            }
        };

        let now = self.clock.time();
        let local_now = self.clock.local_time();

        if let Some(record) = self.sessions.observe(
            window.process_name.clone(),
            window.window_title.clone(),
            local_now,
        ) {
            persist(&self.log, record).await;
        }

        let classification = self.classify(&window);
        if let Some(elapsed) = self.alerts.observe(classification, now) {
            self.raise_alert(elapsed);
        }

        self.current.send_replace(Some(CurrentActivity {
            app_name: window.process_name,
            window_title: window.window_title,
            classification,
        }));
    }

    fn raise_alert(&self, elapsed: Duration) {
        info!(
            "Unproductive time alert triggered after {:.1} minutes",
            elapsed.as_secs_f64() / 60.
        );
        self.notifier
            .notify(ALERT_TITLE, &alert_message(elapsed), NOTIFICATION_TIMEOUT);
        self.listener.on_unproductive_alert(elapsed);
    }

    /// Writes out the open session. Called when the loop stops.
    pub async fn finish(&mut self) {
        if let Some(record) = self.sessions.flush(self.clock.local_time()) {
            persist(&self.log, record).await;
        }
        self.current.send_replace(None);
    }

    /// Executes the sampling loop until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!("Activity tracking started");
        self.alerts.reset();
        let mut collection_point = self.clock.instant();
        loop {
            collection_point += COLLECTION_INTERVAL;

            self.sample()
                .instrument(info_span!("Sampling active window"))
                .await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    break;
                }
                _ = self.clock.sleep_until(collection_point) => ()
            }
        }

        self.finish().await;
        info!("Activity tracking stopped");
        Ok(())
    }
}

/// Persistence is best effort: a failed write is logged and the record dropped.
async fn persist<L: ActivityLog>(log: &L, record: ActivityRecord) {
    debug!("Writing session {:?}", record);
    if let Err(e) = log.append(record).await {
        error!("Error logging activity {e:?}");
    }
}

/// A tracking loop running in the background.
pub struct TrackingHandle {
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
    current: watch::Receiver<Option<CurrentActivity>>,
}

impl TrackingHandle {
    pub fn start_tracking<L: ActivityLog + 'static>(tracker: ActivityTracker<L>) -> Self {
        let current = tracker.subscribe();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(tracker.run(shutdown.clone()));
        Self {
            shutdown,
            task,
            current,
        }
    }

    pub fn current_activity(&self) -> Option<CurrentActivity> {
        self.current.borrow().clone()
    }

    /// Signals the loop to stop and waits for it to flush, at most [STOP_TIMEOUT].
    pub async fn stop_tracking(self) {
        self.shutdown.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, self.task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!("Tracking loop failed {e:?}"),
            Ok(Err(e)) => error!("Tracking task panicked or was aborted {e:?}"),
            Err(_) => warn!("Tracking loop did not stop within {STOP_TIMEOUT:?}"),
        }
    }
}
