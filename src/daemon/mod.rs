use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    config::{Config, ACTIVITY_LOG_FILE_NAME},
    listener::{FocusListener, NoopListener},
    notify::{DesktopNotifier, LogNotifier, Notifier},
    pomodoro::service::PomodoroService,
    storage::activity_log::{ActivityLog, CsvActivityLog},
    tracking::{ActivityTracker, TrackingHandle},
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowObserver, WindowObserver},
};

pub mod args;
pub mod shutdown;

/// What runs next to the tracker and where its events go.
pub struct ServeOptions {
    pub pomodoro: bool,
    pub notifications: bool,
    pub listener: Arc<dyn FocusListener>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            pomodoro: false,
            notifications: true,
            listener: Arc::new(NoopListener),
        }
    }
}

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    serve(dir, ServeOptions::default()).await
}

/// Tracks activity (and optionally runs the Pomodoro timer) until the process is asked to stop.
pub async fn serve(dir: PathBuf, options: ServeOptions) -> Result<()> {
    let config = Config::load_or_default(&dir)?;
    let log = CsvActivityLog::new(config.data_dir(&dir).join(ACTIVITY_LOG_FILE_NAME))?;
    let observer = GenericWindowObserver::new()?;
    let notifier = create_notifier(config.notifications && options.notifications);

    let tracker = create_tracker(
        observer,
        &config,
        log,
        notifier.clone(),
        options.listener.clone(),
        DefaultClock,
    );
    let tracking = TrackingHandle::start_tracking(tracker);

    let mut pomodoro = options.pomodoro.then(|| {
        PomodoroService::new(
            &config.pomodoro,
            options.listener.clone(),
            notifier.clone(),
            Arc::new(DefaultClock),
        )
    });
    if let Some(pomodoro) = &mut pomodoro {
        pomodoro.start().await;
    }

    shutdown::detect_shutdown(CancellationToken::new()).await;
    info!("Shutting down");

    if let Some(mut pomodoro) = pomodoro {
        pomodoro.stop().await;
    }
    tracking.stop_tracking().await;
    Ok(())
}

pub fn create_notifier(desktop: bool) -> Arc<dyn Notifier> {
    if desktop {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(LogNotifier)
    }
}

fn create_tracker<L: ActivityLog>(
    observer: impl WindowObserver + 'static,
    config: &Config,
    log: L,
    notifier: Arc<dyn Notifier>,
    listener: Arc<dyn FocusListener>,
    clock: impl Clock,
) -> ActivityTracker<L> {
    ActivityTracker::new(Box::new(observer), config, log, Box::new(clock))
        .with_notifier(notifier)
        .with_listener(listener)
}

#[cfg(test)]
mod daemon_tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::tempdir;

    use crate::{
        config::Config,
        daemon::create_tracker,
        listener::NoopListener,
        storage::{
            activity_log::{ActivityLog, CsvActivityLog},
            entities::Classification,
        },
        tracking::TrackingHandle,
        utils::{clock::test_clock::TokioClock, logging::TEST_LOGGING},
        window_api::{ActiveWindowData, MockWindowObserver},
    };

    use super::create_notifier;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn test_items() -> Vec<ActiveWindowData> {
        vec![
            ActiveWindowData {
                window_title: "main.rs - focuswatch".into(),
                process_name: "code.exe".into(),
            },
            ActiveWindowData {
                window_title: "main.rs - focuswatch".into(),
                process_name: "code.exe".into(),
            },
            ActiveWindowData {
                window_title: "general".into(),
                process_name: "discord.exe".into(),
            },
        ]
    }

    /// Very simple smoke test of the whole pipeline, from window samples to CSV rows on disk.
    /// Runs on real time since the log does file I/O.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let mut observer = MockWindowObserver::new();
        let mut items = test_items().into_iter().cycle();
        observer
            .expect_get_active_window_info()
            .returning(move || Ok(items.next().unwrap()))
            .times(..7);

        let dir = tempdir()?;
        let log_path = dir.path().join("activity_log.csv");
        let config = Config::default();
        let tracker = create_tracker(
            observer,
            &config,
            CsvActivityLog::new(log_path.clone())?,
            create_notifier(false),
            Arc::new(NoopListener),
            TokioClock::starting_at(TEST_START_DATE),
        );

        let handle = TrackingHandle::start_tracking(tracker);
        tokio::time::sleep(Duration::from_millis(5500)).await;
        handle.stop_tracking().await;

        let records = CsvActivityLog::new(log_path)?
            .read_day(TEST_START_DATE.date())
            .await?;
        assert_eq!(records.len(), 4);
        assert_eq!(
            records
                .iter()
                .map(|v| v.classification)
                .collect::<Vec<_>>(),
            vec![
                Classification::Productive,
                Classification::Unproductive,
                Classification::Productive,
                Classification::Unproductive,
            ]
        );
        Ok(())
    }
}
