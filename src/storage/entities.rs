use std::{fmt::Display, str::FromStr, sync::Arc};

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Three-way verdict about an application or website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Productive,
    Unproductive,
    Neutral,
}

impl Classification {
    /// Tag stored in the activity log. These are the historical `True`/`False`/`None` values, so
    /// old logs stay readable.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Classification::Productive => "True",
            Classification::Unproductive => "False",
            Classification::Neutral => "None",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Productive => "Productive",
            Classification::Unproductive => "Unproductive",
            Classification::Neutral => "Neutral",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Classification {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "True" => Ok(Classification::Productive),
            "False" => Ok(Classification::Unproductive),
            "None" => Ok(Classification::Neutral),
            other => Err(anyhow!("Unknown classification tag {other:?}")),
        }
    }
}

/// One finished session: the user looked at `window_title` of `app_name` for `duration_seconds`.
/// `timestamp` is the local time the session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub timestamp: NaiveDateTime,
    pub app_name: Arc<str>,
    pub window_title: Arc<str>,
    pub duration_seconds: f64,
    pub classification: Classification,
}

impl ActivityRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Score of a single day together with the totals it was computed from. All times are seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyScoreRecord {
    pub date: NaiveDate,
    pub score: f64,
    pub total_time: f64,
    pub productive_time: f64,
    pub unproductive_time: f64,
    pub neutral_time: f64,
}

#[cfg(test)]
mod tests {
    use super::Classification;

    #[test]
    fn test_classification_tags_are_stable() {
        assert_eq!(Classification::Productive.as_tag(), "True");
        assert_eq!(Classification::Unproductive.as_tag(), "False");
        assert_eq!(Classification::Neutral.as_tag(), "None");
        assert_eq!("None".parse::<Classification>().unwrap(), Classification::Neutral);
        assert!("maybe".parse::<Classification>().is_err());
    }
}
