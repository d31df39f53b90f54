use std::{collections::BTreeMap, future::Future, io::ErrorKind, ops::Deref, path::PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entities::DailyScoreRecord;

pub type ScoreMap = BTreeMap<NaiveDate, DailyScoreRecord>;

/// Durable cache of computed daily scores. The whole map is rewritten on every save.
pub trait ScoreStore: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<ScoreMap>> + Send;

    fn save(&self, scores: &ScoreMap) -> impl Future<Output = Result<()>> + Send;

    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref + Send + Sync> ScoreStore for T
where
    T::Target: ScoreStore,
{
    fn load(&self) -> impl Future<Output = Result<ScoreMap>> + Send {
        self.deref().load()
    }

    fn save(&self, scores: &ScoreMap) -> impl Future<Output = Result<()>> + Send {
        self.deref().save(scores)
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        self.deref().clear()
    }
}

/// Entry of the JSON object. The date is the key, so it isn't repeated inside.
#[derive(Debug, Serialize, Deserialize)]
struct StoredScore {
    score: f64,
    #[serde(default)]
    total_time: f64,
    #[serde(default)]
    productive_time: f64,
    #[serde(default)]
    unproductive_time: f64,
    #[serde(default)]
    neutral_time: f64,
}

impl StoredScore {
    fn into_record(self, date: NaiveDate) -> DailyScoreRecord {
        DailyScoreRecord {
            date,
            score: self.score,
            total_time: self.total_time,
            productive_time: self.productive_time,
            unproductive_time: self.unproductive_time,
            neutral_time: self.neutral_time,
        }
    }
}

impl From<&DailyScoreRecord> for StoredScore {
    fn from(record: &DailyScoreRecord) -> Self {
        Self {
            score: record.score,
            total_time: record.total_time,
            productive_time: record.productive_time,
            unproductive_time: record.unproductive_time,
            neutral_time: record.neutral_time,
        }
    }
}

/// Keeps scores in a pretty printed JSON object keyed by `YYYY-MM-DD`.
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }
}

impl ScoreStore for JsonScoreStore {
    async fn load(&self) -> Result<ScoreMap> {
        debug!("Loading scores from {:?}", self.path);
        match tokio::fs::read(&self.path).await {
            Ok(content) => {
                let stored: BTreeMap<NaiveDate, StoredScore> = serde_json::from_slice(&content)?;
                Ok(stored
                    .into_iter()
                    .map(|(date, score)| (date, score.into_record(date)))
                    .collect())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ScoreMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, scores: &ScoreMap) -> Result<()> {
        let stored = scores
            .iter()
            .map(|(date, record)| (*date, StoredScore::from(record)))
            .collect::<BTreeMap<_, _>>();
        let content = serde_json::to_vec_pretty(&stored)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};

    use super::{ScoreMap, ScoreStore};

    #[derive(Default)]
    pub struct MemoryScoreStore {
        pub scores: Mutex<ScoreMap>,
        pub saves: Mutex<usize>,
        pub read_only: Mutex<bool>,
    }

    impl MemoryScoreStore {
        pub fn with_scores(scores: ScoreMap) -> Self {
            Self {
                scores: Mutex::new(scores),
                ..Default::default()
            }
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl ScoreStore for MemoryScoreStore {
        async fn load(&self) -> Result<ScoreMap> {
            Ok(self.scores.lock().unwrap().clone())
        }

        async fn save(&self, scores: &ScoreMap) -> Result<()> {
            *self.saves.lock().unwrap() += 1;
            if *self.read_only.lock().unwrap() {
                return Err(anyhow!("store is read only"));
            }
            *self.scores.lock().unwrap() = scores.clone();
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.scores.lock().unwrap().clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::storage::entities::DailyScoreRecord;

    use super::{JsonScoreStore, ScoreMap, ScoreStore};

    #[tokio::test]
    async fn test_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonScoreStore::new(dir.path().join("focus_scores.json"))?;
        assert!(store.load().await?.is_empty());
        store.clear().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_scores_are_keyed_by_date() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("focus_scores.json");
        let store = JsonScoreStore::new(path.clone())?;
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

        let mut scores = ScoreMap::new();
        scores.insert(
            date,
            DailyScoreRecord {
                date,
                score: 84.5,
                total_time: 1000.,
                productive_time: 700.,
                unproductive_time: 300.,
                neutral_time: 0.,
            },
        );
        store.save(&scores).await?;

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(raw["2024-03-02"]["score"], 84.5);
        assert_eq!(raw["2024-03-02"]["productive_time"], 700.);
        assert!(raw["2024-03-02"].get("date").is_none());

        assert_eq!(store.load().await?, scores);

        store.clear().await?;
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_entries_without_dates() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("focus_scores.json");
        std::fs::write(
            &path,
            r#"{
                "2024-03-01": {"score": 62.5, "total_time": 3600, "productive_time": 2000,
                               "unproductive_time": 1000, "neutral_time": 600},
                "2024-03-02": {"score": 0, "total_time": 30}
            }"#,
        )?;
        let store = JsonScoreStore::new(path)?;

        let scores = store.load().await?;
        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&first].date, first);
        assert_eq!(scores[&first].score, 62.5);
        assert_eq!(scores[&first].neutral_time, 600.);
        assert_eq!(scores[&second].date, second);
        assert_eq!(scores[&second].productive_time, 0.);

        // Saving keeps what was loaded.
        store.save(&scores).await?;
        assert_eq!(store.load().await?, scores);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("focus_scores.json");
        std::fs::write(&path, "{ not json")?;
        let store = JsonScoreStore::new(path)?;
        assert!(store.load().await.is_err());
        Ok(())
    }
}
