use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;

use crate::{
    config::ScoreConfig,
    storage::entities::{ActivityRecord, Classification, DailyScoreRecord},
    utils::percentage::Percentage,
};

/// Score given when a day has tracked time but none of it weighs either way.
pub const NEUTRAL_SCORE: f64 = 50.;

/// How many apps [DailySummary::top_apps] keeps.
pub const TOP_APPS: usize = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Totals {
    total: f64,
    productive: f64,
    unproductive: f64,
}

impl Totals {
    fn of<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Self {
        records.into_iter().fold(Totals::default(), |mut acc, record| {
            acc.total += record.duration_seconds;
            match record.classification {
                Classification::Productive => acc.productive += record.duration_seconds,
                Classification::Unproductive => acc.unproductive += record.duration_seconds,
                Classification::Neutral => {}
            }
            acc
        })
    }
}

/// Weighted share of productive time, bounded by the configured limits.
pub fn weighted_score(config: &ScoreConfig, productive_time: f64, unproductive_time: f64) -> f64 {
    let weighted_productive = productive_time * config.productive_weight;
    let weighted_unproductive = unproductive_time * config.unproductive_weight;

    let score = if weighted_productive + weighted_unproductive > 0. {
        weighted_productive / (weighted_productive + weighted_unproductive) * 100.
    } else {
        NEUTRAL_SCORE
    };
    // Not `clamp`, which panics on inverted or NaN bounds.
    score.max(config.min_score).min(config.max_score)
}

/// Builds the score record of `date` from the records logged on that day.
pub fn score_day<'a>(
    config: &ScoreConfig,
    date: NaiveDate,
    records: impl IntoIterator<Item = &'a ActivityRecord>,
) -> DailyScoreRecord {
    let totals = Totals::of(records);

    let score = if totals.total < config.min_tracked_secs {
        0.
    } else {
        weighted_score(config, totals.productive, totals.unproductive)
    };

    DailyScoreRecord {
        date,
        score,
        total_time: totals.total,
        productive_time: totals.productive,
        unproductive_time: totals.unproductive,
        neutral_time: totals.total - totals.productive - totals.unproductive,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppUsage {
    pub app_name: Arc<str>,
    pub seconds: f64,
}

/// Overview of a single day, independent of the score cache.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_time: f64,
    pub productive_time: f64,
    pub unproductive_time: f64,
    pub productive_percentage: Percentage,
    /// Most used apps, longest first.
    pub top_apps: Vec<AppUsage>,
}

/// Sums time per app, longest first. Equal times are ordered by name.
pub fn usage_by_app<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Vec<AppUsage> {
    let mut map = HashMap::<Arc<str>, f64>::new();
    for record in records {
        *map.entry(record.app_name.clone()).or_default() += record.duration_seconds;
    }

    let mut usages = map
        .into_iter()
        .map(|(app_name, seconds)| AppUsage { app_name, seconds })
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.seconds
            .total_cmp(&a.seconds)
            .then_with(|| a.app_name.cmp(&b.app_name))
    });
    usages
}

pub fn summarize(date: NaiveDate, records: &[ActivityRecord]) -> DailySummary {
    let totals = Totals::of(records);
    let mut top_apps = usage_by_app(records);
    top_apps.truncate(TOP_APPS);

    DailySummary {
        date,
        total_time: totals.total,
        productive_time: totals.productive,
        unproductive_time: totals.unproductive,
        productive_percentage: Percentage::of(totals.productive, totals.total),
        top_apps,
    }
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{config::ScoreConfig, storage::entities::Classification};

    use super::{score_day, summarize, test_records::record, weighted_score, TOP_APPS};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[test]
    fn test_weighted_ratio() {
        let records = [
            record(day(), "code.exe", 700., Classification::Productive),
            record(day(), "discord.exe", 300., Classification::Unproductive),
            record(day(), "explorer.exe", 100., Classification::Neutral),
        ];
        let result = score_day(&ScoreConfig::default(), day(), &records);
        assert!((result.score - 490. / 580. * 100.).abs() < 1e-9);
        assert!((result.score - 84.48).abs() < 0.01);
        assert_eq!(result.total_time, 1100.);
        assert_eq!(result.neutral_time, 100.);
    }

    #[test]
    fn test_short_days_score_zero() {
        let records = [record(day(), "code.exe", 59., Classification::Productive)];
        let result = score_day(&ScoreConfig::default(), day(), &records);
        assert_eq!(result.score, 0.);
        assert_eq!(result.productive_time, 59.);
    }

    #[test]
    fn test_only_neutral_time_is_neutral_score() {
        let records = [record(day(), "explorer.exe", 600., Classification::Neutral)];
        assert_eq!(score_day(&ScoreConfig::default(), day(), &records).score, 50.);
    }

    #[test]
    fn test_score_is_clamped() {
        let config = ScoreConfig {
            min_score: 10.,
            max_score: 90.,
            ..Default::default()
        };
        assert_eq!(weighted_score(&config, 100., 0.), 90.);
        assert_eq!(weighted_score(&config, 0., 100.), 10.);
    }

    #[test]
    fn test_broken_bounds_dont_panic() {
        let records = [record(day(), "code.exe", 600., Classification::Productive)];
        let inverted = ScoreConfig {
            min_score: 100.,
            max_score: 0.,
            ..Default::default()
        };
        assert_eq!(score_day(&inverted, day(), &records).score, 0.);

        let nan = ScoreConfig {
            min_score: f64::NAN,
            max_score: f64::NAN,
            ..Default::default()
        };
        assert_eq!(score_day(&nan, day(), &records).score, 100.);
    }

    #[test]
    fn test_summary_keeps_top_apps() {
        let mut records = (0..12)
            .map(|i| {
                record(
                    day(),
                    &format!("app{i:02}"),
                    i as f64 * 10.,
                    Classification::Neutral,
                )
            })
            .collect::<Vec<_>>();
        records.push(record(day(), "code.exe", 200., Classification::Productive));
        records.push(record(day(), "code.exe", 200., Classification::Productive));

        let summary = summarize(day(), &records);
        assert_eq!(summary.top_apps.len(), TOP_APPS);
        assert_eq!(&*summary.top_apps[0].app_name, "code.exe");
        assert_eq!(summary.top_apps[0].seconds, 400.);
        assert_eq!(&*summary.top_apps[1].app_name, "app11");
        assert_eq!(summary.total_time, 1060.);
        assert_eq!(summary.productive_percentage.to_string(), "37.7%");
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(day(), &[]);
        assert_eq!(*summary.productive_percentage, 0.);
        assert!(summary.top_apps.is_empty());
    }
}
