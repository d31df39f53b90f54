//! Keyboard control of the timer run by `focuswatch pomodoro`. One command per line.

use std::{io::BufRead, str::FromStr};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::pomodoro::service::PomodoroService;

pub const CONTROLS_HELP: &str = "Type p to pause, r to resume, q to quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Pause,
    Resume,
    Quit,
}

impl FromStr for TimerCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p" | "pause" => Ok(Self::Pause),
            "r" | "resume" => Ok(Self::Resume),
            "q" | "quit" => Ok(Self::Quit),
            other => Err(anyhow!("Unknown timer command {other:?}")),
        }
    }
}

/// Forwards stdin lines from a detached thread. A blocking stdin read can't be cancelled, so it
/// is kept off the runtime, which would otherwise wait for it on shutdown.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("focuswatch-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Couldn't read timer commands from stdin {e:?}");
    }
    receiver
}

/// Applies commands to `service` until one asks to quit, which returns true, or the input ends,
/// which returns false.
pub async fn control_timer(
    service: &PomodoroService,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> bool {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<TimerCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}. {CONTROLS_HELP}");
                continue;
            }
        };
        debug!("Timer command {command:?}");
        match command {
            TimerCommand::Pause => {
                if service.pause().await {
                    println!("Paused");
                }
            }
            TimerCommand::Resume => {
                if service.resume().await {
                    println!("Resumed");
                }
            }
            TimerCommand::Quit => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tokio::sync::mpsc;

    use crate::{
        config::PomodoroConfig,
        listener::NoopListener,
        notify::LogNotifier,
        pomodoro::service::PomodoroService,
        utils::{clock::test_clock::TokioClock, logging::TEST_LOGGING},
    };

    use super::{control_timer, TimerCommand};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn lines(values: &[&str]) -> mpsc::UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded_channel();
        for value in values {
            sender.send(value.to_string()).unwrap();
        }
        receiver
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("p".parse::<TimerCommand>().unwrap(), TimerCommand::Pause);
        assert_eq!(" Resume\n".parse::<TimerCommand>().unwrap(), TimerCommand::Resume);
        assert_eq!("q".parse::<TimerCommand>().unwrap(), TimerCommand::Quit);
        assert!("x".parse::<TimerCommand>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_pause_and_resume_the_timer() {
        *TEST_LOGGING;
        let mut service = PomodoroService::new(
            &PomodoroConfig::default(),
            Arc::new(NoopListener),
            Arc::new(LogNotifier),
            Arc::new(TokioClock::starting_at(TEST_START_DATE)),
        );
        service.start().await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        // Input ends without a quit.
        assert!(!control_timer(&service, lines(&["p", "", "nonsense"])).await);
        let paused = service.state().await;
        assert!(paused.paused);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(service.state().await.time_remaining, paused.time_remaining);

        assert!(control_timer(&service, lines(&["r", "q", "p"])).await);
        assert!(!service.state().await.paused);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            service.state().await.time_remaining,
            paused.time_remaining - 2
        );
        service.stop().await;
    }
}
