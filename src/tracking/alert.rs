use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::storage::entities::Classification;

pub const ALERT_TITLE: &str = "Productivity Alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    /// Unproductive since `since`, alert not raised yet.
    Accumulating { since: DateTime<Utc> },
    /// The alert for the run that started at `since` was raised. Stays here until reset.
    AlertFired { since: DateTime<Utc> },
}

/// Follows continuous unproductive time across app switches. Only a productive classification
/// ends a run; neutral samples neither start nor end one.
#[derive(Debug)]
pub struct UnproductiveAlertTracker {
    threshold: Duration,
    state: AlertState,
}

impl UnproductiveAlertTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: AlertState::Idle,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Forgets the current run. Used when tracking restarts.
    pub fn reset(&mut self) {
        self.state = AlertState::Idle;
    }

    /// Feeds the classification of what is focused at `now`. Returns the elapsed unproductive
    /// time when the alert should be raised; this happens at most once per run.
    pub fn observe(
        &mut self,
        classification: Classification,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        match (self.state, classification) {
            (AlertState::Idle, Classification::Unproductive) => {
                debug!("Started tracking unproductive time at {now}");
                self.state = AlertState::Accumulating { since: now };
            }
            (
                AlertState::Accumulating { since } | AlertState::AlertFired { since },
                Classification::Productive,
            ) => {
                info!(
                    "Unproductive session ended after {:.1} seconds",
                    elapsed(since, now).as_secs_f64()
                );
                self.state = AlertState::Idle;
            }
            _ => {}
        }

        match self.state {
            AlertState::Accumulating { since } if elapsed(since, now) >= self.threshold => {
                self.state = AlertState::AlertFired { since };
                Some(elapsed(since, now))
            }
            _ => None,
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

/// Notification body for an alert raised after `elapsed` of unproductive time.
pub fn alert_message(elapsed: Duration) -> String {
    format!(
        "You've been unproductive for over {} minute(s). Consider switching to a productive task.",
        elapsed.as_secs() / 60
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::storage::entities::Classification;

    use super::{alert_message, AlertState, UnproductiveAlertTracker};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + chrono::Duration::seconds(seconds)
    }

    /// Feeds one sample per second and returns the ticks on which an alert fired.
    fn feed(
        tracker: &mut UnproductiveAlertTracker,
        ticks: std::ops::Range<i64>,
        classification: Classification,
    ) -> Vec<i64> {
        ticks
            .filter(|tick| tracker.observe(classification, at(*tick)).is_some())
            .collect()
    }

    #[test]
    fn test_alert_fires_once_per_run() {
        let mut tracker = UnproductiveAlertTracker::new(Duration::from_secs(60));

        let fired = feed(&mut tracker, 0..120, Classification::Unproductive);
        assert_eq!(fired, vec![60]);
        assert_eq!(tracker.state(), AlertState::AlertFired { since: at(0) });

        // A productive sample resets, the next run alerts again.
        assert!(tracker.observe(Classification::Productive, at(120)).is_none());
        assert_eq!(tracker.state(), AlertState::Idle);

        let fired = feed(&mut tracker, 121..200, Classification::Unproductive);
        assert_eq!(fired, vec![181]);
    }

    #[test]
    fn test_neutral_keeps_accumulating() {
        let mut tracker = UnproductiveAlertTracker::new(Duration::from_secs(60));
        assert!(feed(&mut tracker, 0..30, Classification::Unproductive).is_empty());
        let fired = feed(&mut tracker, 30..90, Classification::Neutral);
        assert_eq!(fired, vec![60]);
    }

    #[test]
    fn test_neutral_does_not_start_a_run() {
        let mut tracker = UnproductiveAlertTracker::new(Duration::from_secs(60));
        assert!(feed(&mut tracker, 0..120, Classification::Neutral).is_empty());
        assert_eq!(tracker.state(), AlertState::Idle);
    }

    #[test]
    fn test_productive_before_threshold_prevents_alert() {
        let mut tracker = UnproductiveAlertTracker::new(Duration::from_secs(60));
        feed(&mut tracker, 0..59, Classification::Unproductive);
        tracker.observe(Classification::Productive, at(59));
        let fired = feed(&mut tracker, 60..100, Classification::Unproductive);
        assert!(fired.is_empty());
        assert_eq!(tracker.state(), AlertState::Accumulating { since: at(60) });
    }

    #[test]
    fn test_alert_message_counts_whole_minutes() {
        assert_eq!(
            alert_message(Duration::from_secs(150)),
            "You've been unproductive for over 2 minute(s). Consider switching to a productive task."
        );
    }
}
