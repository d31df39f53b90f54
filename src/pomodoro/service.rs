use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::PomodoroConfig,
    listener::FocusListener,
    notify::{Notifier, NOTIFICATION_TIMEOUT},
    utils::clock::Clock,
};

use super::{PomodoroEvent, PomodoroState, PomodoroTimer};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How long [PomodoroService::stop] waits for the countdown task.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

struct Countdown {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs a [PomodoroTimer] on a background task, one tick per second. Listener callbacks and
/// notifications are delivered outside of the timer lock.
pub struct PomodoroService {
    timer: Arc<Mutex<PomodoroTimer>>,
    listener: Arc<dyn FocusListener>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    countdown: Option<Countdown>,
}

impl PomodoroService {
    pub fn new(
        config: &PomodoroConfig,
        listener: Arc<dyn FocusListener>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            timer: Arc::new(Mutex::new(PomodoroTimer::new(config))),
            listener,
            notifier,
            clock,
            countdown: None,
        }
    }

    pub async fn state(&self) -> PomodoroState {
        self.timer.lock().await.state().clone()
    }

    /// Starts a work phase and the countdown. No-op if already running.
    pub async fn start(&mut self) {
        if !self.timer.lock().await.start() {
            return;
        }
        // A previous countdown may still be winding down after a stop.
        self.join_countdown().await;

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run_countdown(
            self.timer.clone(),
            self.listener.clone(),
            self.notifier.clone(),
            self.clock.clone(),
            shutdown.clone(),
        ));
        self.countdown = Some(Countdown { shutdown, task });
    }

    /// Returns false if the timer wasn't running or was already paused.
    pub async fn pause(&self) -> bool {
        self.timer.lock().await.pause()
    }

    pub async fn resume(&self) -> bool {
        self.timer.lock().await.resume()
    }

    /// Resets the timer and waits for the countdown to exit, at most [STOP_TIMEOUT].
    pub async fn stop(&mut self) {
        self.timer.lock().await.stop();
        self.join_countdown().await;
    }

    async fn join_countdown(&mut self) {
        let Some(countdown) = self.countdown.take() else {
            return;
        };
        countdown.shutdown.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, countdown.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Pomodoro task panicked or was aborted {e:?}"),
            Err(_) => warn!("Pomodoro countdown did not stop within {STOP_TIMEOUT:?}"),
        }
    }
}

async fn run_countdown(
    timer: Arc<Mutex<PomodoroTimer>>,
    listener: Arc<dyn FocusListener>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) {
    info!("Pomodoro countdown started");
    let mut tick_point = clock.instant();
    loop {
        tick_point += TICK_INTERVAL;
        tokio::select! {
            _ = shutdown.cancelled() => {
                break;
            }
            _ = clock.sleep_until(tick_point) => ()
        }

        let events = timer.lock().await.tick();
        dispatch(events, listener.as_ref(), notifier.as_ref());
    }
    info!("Pomodoro countdown stopped");
}

fn dispatch(events: Vec<PomodoroEvent>, listener: &dyn FocusListener, notifier: &dyn Notifier) {
    for event in events {
        match event {
            PomodoroEvent::Tick(state) => listener.on_tick(&state),
            PomodoroEvent::PhaseChanged {
                phase,
                title,
                message,
            } => {
                notifier.notify(title, message, NOTIFICATION_TIMEOUT);
                listener.on_phase_change(phase);
            }
            PomodoroEvent::CycleCompleted(cycle_count) => listener.on_complete(cycle_count),
        }
    }
}
