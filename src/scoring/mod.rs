//! Daily focus scores on top of the activity log, cached per date in a [ScoreStore].
//!
//! A day is computed once and then served from the cache, even if more activity is logged for it
//! later. That includes the current day. [FocusScoreEngine::invalidate] is the way to force a
//! recomputation.

pub mod daily;
pub mod suggestions;

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use daily::{score_day, summarize, usage_by_app, DailySummary};
use tracing::{debug, error, info, warn};

use crate::{
    config::ScoreConfig,
    storage::{
        activity_log::ActivityLog,
        entities::{Classification, DailyScoreRecord},
        score_store::{ScoreMap, ScoreStore},
    },
    utils::{clock::Clock, time::days_ending_at},
};

/// Length of the window [FocusScoreEngine::get_weekly_analysis] looks at.
pub const WEEK_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct DayScore {
    pub date: NaiveDate,
    pub score: f64,
    pub productive_hours: f64,
    pub unproductive_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAnalysis {
    /// Oldest first, always [WEEK_DAYS] long. Days without data are zeros.
    pub days: Vec<DayScore>,
    pub streak: u32,
    pub most_productive_day: Option<NaiveDate>,
    pub average_score: f64,
    pub suggestions: Vec<String>,
}

pub struct FocusScoreEngine<L: ActivityLog, S: ScoreStore> {
    config: ScoreConfig,
    log: L,
    store: S,
    scores: ScoreMap,
    clock: Box<dyn Clock>,
}

impl<L: ActivityLog, S: ScoreStore> FocusScoreEngine<L, S> {
    /// Loads the score cache. An unreadable cache is logged and treated as empty.
    pub async fn load(config: &ScoreConfig, log: L, store: S, clock: Box<dyn Clock>) -> Self {
        let scores = store
            .load()
            .await
            .inspect_err(|e| warn!("Could not load score cache, starting empty {e:?}"))
            .unwrap_or_default();
        debug!("Loaded {} cached scores", scores.len());
        Self {
            config: config.clone(),
            log,
            store,
            scores,
            clock,
        }
    }

    pub fn cached(&self, date: NaiveDate) -> Option<&DailyScoreRecord> {
        self.scores.get(&date)
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.scores).await {
            error!("Error saving scores {e:?}");
        }
    }

    /// Score record of `date`, computed from the log unless it is already cached.
    /// Returns `None` if the log can't be read; nothing is cached then.
    pub async fn daily_record(&mut self, date: NaiveDate) -> Option<DailyScoreRecord> {
        if let Some(record) = self.scores.get(&date) {
            return Some(record.clone());
        }

        let records = match self.log.read_day(date).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error reading activity data {e:?}");
                return None;
            }
        };

        let record = score_day(&self.config, date, &records);
        debug!("Computed score for {date}: {:.2}", record.score);

        // Days that haven't happened yet would only poison the streak.
        if date <= self.clock.today() {
            self.scores.insert(date, record.clone());
            self.persist().await;
        }
        Some(record)
    }

    /// Focus score of `date` in `[min_score, max_score]`, 0 when it can't be computed.
    pub async fn calculate_daily_score(&mut self, date: NaiveDate) -> f64 {
        self.daily_record(date)
            .await
            .map(|record| record.score)
            .unwrap_or(0.)
    }

    /// Consecutive days, ending today, whose cached score reaches the streak threshold.
    pub fn get_streak(&self) -> u32 {
        let today = self.clock.today();
        self.scores
            .iter()
            .rev()
            .enumerate()
            .take_while(|(i, (date, record))| {
                **date == today - Duration::days(*i as i64)
                    && record.score >= self.config.streak_threshold
            })
            .count() as u32
    }

    pub async fn get_weekly_analysis(&mut self) -> WeeklyAnalysis {
        let window = days_ending_at(self.clock.today(), WEEK_DAYS);

        let mut days = Vec::with_capacity(window.len());
        for date in &window {
            let record = self.daily_record(*date).await;
            days.push(match record {
                Some(record) => DayScore {
                    date: *date,
                    score: record.score,
                    productive_hours: record.productive_time / 3600.,
                    unproductive_hours: record.unproductive_time / 3600.,
                },
                None => DayScore {
                    date: *date,
                    score: 0.,
                    productive_hours: 0.,
                    unproductive_hours: 0.,
                },
            });
        }

        // First day with the highest score.
        let most_productive_day = days
            .iter()
            .fold(None::<&DayScore>, |best, day| match best {
                Some(best) if best.score >= day.score => Some(best),
                _ => Some(day),
            })
            .map(|day| day.date);

        let average_score = days.iter().map(|day| day.score).sum::<f64>() / days.len() as f64;

        WeeklyAnalysis {
            streak: self.get_streak(),
            most_productive_day,
            average_score,
            suggestions: self.suggestions(&window).await,
            days,
        }
    }

    async fn suggestions(&self, window: &[NaiveDate]) -> Vec<String> {
        let scores = window
            .iter()
            .filter_map(|date| self.scores.get(date).map(|record| record.score))
            .collect::<Vec<_>>();

        let dates = window.iter().copied().collect::<HashSet<_>>();
        let unproductive = match self.log.read_all().await {
            Ok(records) => usage_by_app(records.iter().filter(|record| {
                record.classification == Classification::Unproductive
                    && dates.contains(&record.date())
            })),
            Err(e) => {
                warn!("Error reading app data {e:?}");
                vec![]
            }
        };

        suggestions::generate(&scores, &unproductive)
    }

    /// Totals and most used apps of `date`, straight from the log.
    pub async fn daily_summary(&self, date: NaiveDate) -> Option<DailySummary> {
        match self.log.read_day(date).await {
            Ok(records) => Some(summarize(date, &records)),
            Err(e) => {
                error!("Error getting daily summary {e:?}");
                None
            }
        }
    }

    /// Drops the cached score of `date`. Returns whether there was one.
    pub async fn invalidate(&mut self, date: NaiveDate) -> bool {
        let existed = self.scores.remove(&date).is_some();
        if existed {
            info!("Invalidated cached score for {date}");
            self.persist().await;
        }
        existed
    }

    /// Deletes all logged activity and every cached score.
    pub async fn reset_data(&mut self) -> Result<()> {
        self.scores.clear();
        self.log
            .clear()
            .await
            .inspect_err(|e| error!("Failed to clear activity log {e:?}"))?;
        self.store
            .clear()
            .await
            .inspect_err(|e| error!("Failed to clear score cache {e:?}"))?;
        info!("All tracking data was reset");
        Ok(())
    }
}
