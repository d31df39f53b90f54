use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::pomodoro::{Phase, PomodoroState};

/// Hooks the presentation layer uses to follow the core. Invoked synchronously from the
/// background loops, so implementations should return quickly.
#[cfg_attr(test, automock)]
pub trait FocusListener: Send + Sync {
    /// Called every second the Pomodoro timer counts down.
    fn on_tick(&self, _state: &PomodoroState) {}

    fn on_phase_change(&self, _phase: Phase) {}

    /// Called when a break is over and the next work phase starts.
    fn on_complete(&self, _cycle_count: u32) {}

    /// Called once per continuous unproductive run, when it crosses the threshold.
    fn on_unproductive_alert(&self, _elapsed: Duration) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default)]
pub struct NoopListener;

impl FocusListener for NoopListener {}
