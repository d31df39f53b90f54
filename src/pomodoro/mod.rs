//! Pomodoro countdown. [PomodoroTimer] is a plain state machine advanced by calling
//! [PomodoroTimer::tick] once per second; [service::PomodoroService] drives it in the background.
//!
//! ```text
//! Ready -> Work -> ShortBreak -> Work -> ... -> LongBreak -> Work
//! ```

pub mod service;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PomodoroConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Ready,
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Ready => "Ready",
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PomodoroState {
    pub phase: Phase,
    /// Completed work phases since the timer was started.
    pub cycle_count: u32,
    /// Seconds left in the current phase.
    pub time_remaining: u32,
    /// Full length of the current phase in seconds, 0 when [Phase::Ready].
    pub phase_duration: u32,
    pub running: bool,
    pub paused: bool,
}

impl PomodoroState {
    /// `MM:SS`
    pub fn time_remaining_str(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.time_remaining / 60,
            self.time_remaining % 60
        )
    }

    /// Elapsed share of the current phase, 0 to 100.
    pub fn progress(&self) -> f64 {
        if self.phase == Phase::Ready || self.phase_duration == 0 {
            return 0.;
        }
        let elapsed = self.phase_duration.saturating_sub(self.time_remaining);
        elapsed as f64 / self.phase_duration as f64 * 100.
    }
}

/// What happened during a tick. Produced in the order listeners should hear about it.
#[derive(Debug, Clone, PartialEq)]
pub enum PomodoroEvent {
    Tick(PomodoroState),
    PhaseChanged {
        phase: Phase,
        title: &'static str,
        message: &'static str,
    },
    /// A break ended; carries the number of completed work phases.
    CycleCompleted(u32),
}

pub struct PomodoroTimer {
    work_duration: u32,
    short_break_duration: u32,
    long_break_duration: u32,
    cycles_before_long_break: u32,
    state: PomodoroState,
}

impl PomodoroTimer {
    pub fn new(config: &PomodoroConfig) -> Self {
        let work_duration = config.work_duration();
        Self {
            work_duration,
            short_break_duration: config.short_break_duration(),
            long_break_duration: config.long_break_duration(),
            cycles_before_long_break: config.cycles_before_long_break.max(1),
            state: PomodoroState {
                phase: Phase::Ready,
                cycle_count: 0,
                time_remaining: work_duration,
                phase_duration: 0,
                running: false,
                paused: false,
            },
        }
    }

    pub fn state(&self) -> &PomodoroState {
        &self.state
    }

    pub fn get_progress(&self) -> f64 {
        self.state.progress()
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Ready => 0,
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.state.phase_duration = self.duration_of(phase);
        self.state.time_remaining = self.state.phase_duration;
    }

    /// Starts a work phase. Returns `false` if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            debug!("Timer already running");
            return false;
        }
        self.state.running = true;
        self.state.paused = false;
        self.enter(Phase::Work);
        info!("Pomodoro timer started");
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.running || self.state.paused {
            return false;
        }
        self.state.paused = true;
        info!("Pomodoro timer paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.state.running || !self.state.paused {
            return false;
        }
        self.state.paused = false;
        info!("Pomodoro timer resumed");
        true
    }

    pub fn stop(&mut self) {
        self.state.running = false;
        self.state.paused = false;
        self.state.cycle_count = 0;
        self.state.phase = Phase::Ready;
        self.state.phase_duration = 0;
        self.state.time_remaining = self.work_duration;
        info!("Pomodoro timer stopped");
    }

    /// Counts one second down. Does nothing unless running and not paused.
    pub fn tick(&mut self) -> Vec<PomodoroEvent> {
        if !self.state.running || self.state.paused {
            return vec![];
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        let mut events = vec![PomodoroEvent::Tick(self.state.clone())];

        if self.state.time_remaining == 0 {
            self.complete_phase(&mut events);
        }
        events
    }

    fn complete_phase(&mut self, events: &mut Vec<PomodoroEvent>) {
        let (phase, title, message) = match self.state.phase {
            Phase::Work => {
                self.state.cycle_count += 1;
                if self.state.cycle_count % self.cycles_before_long_break == 0 {
                    (
                        Phase::LongBreak,
                        "Time for a long break!",
                        "Take a longer break to recharge.",
                    )
                } else {
                    (
                        Phase::ShortBreak,
                        "Time for a short break!",
                        "Take a quick break to refresh.",
                    )
                }
            }
            Phase::ShortBreak | Phase::LongBreak => {
                (Phase::Work, "Break over!", "Time to get back to work.")
            }
            Phase::Ready => return,
        };

        info!("Pomodoro phase {} -> {}", self.state.phase, phase);
        self.enter(phase);
        events.push(PomodoroEvent::PhaseChanged {
            phase,
            title,
            message,
        });
        if phase == Phase::Work {
            events.push(PomodoroEvent::CycleCompleted(self.state.cycle_count));
        }
    }
}
