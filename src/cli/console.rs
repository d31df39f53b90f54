use std::time::Duration;

use ansi_term::Colour;

use crate::{
    listener::FocusListener,
    pomodoro::{Phase, PomodoroState},
    storage::entities::Classification,
    tracking::alert::alert_message,
};

/// Paints a classification label the way every report shows it.
pub fn paint_classification(classification: Classification) -> String {
    let colour = match classification {
        Classification::Productive => Colour::Green,
        Classification::Unproductive => Colour::Red,
        Classification::Neutral => Colour::Yellow,
    };
    colour.paint(classification.label()).to_string()
}

/// Prints what the tracker and timer report to stdout. Used by the foreground commands.
#[derive(Debug, Default)]
pub struct ConsoleListener;

impl FocusListener for ConsoleListener {
    fn on_tick(&self, state: &PomodoroState) {
        if state.time_remaining % 60 == 0 && state.time_remaining > 0 {
            println!(
                "{}\t{} left\t{:.0}%",
                state.phase,
                state.time_remaining_str(),
                state.progress()
            );
        }
    }

    fn on_phase_change(&self, phase: Phase) {
        let colour = if phase.is_break() {
            Colour::Cyan
        } else {
            Colour::Purple
        };
        println!("{}", colour.bold().paint(format!("Now: {phase}")));
    }

    fn on_complete(&self, cycle_count: u32) {
        println!("Completed pomodoros: {cycle_count}");
    }

    fn on_unproductive_alert(&self, elapsed: Duration) {
        println!("{}", Colour::Red.bold().paint(alert_message(elapsed)));
    }
}
