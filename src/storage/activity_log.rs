use std::{
    future::Future,
    io::{ErrorKind, Write},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::{format_timestamp, parse_timestamp};

use super::{
    csv::{join_row, split_row},
    entities::{ActivityRecord, Classification},
};

pub const LOG_HEADER: [&str; 5] = [
    "timestamp",
    "app_name",
    "window_title",
    "duration_seconds",
    "is_productive",
];

/// Append-only store of finished sessions.
pub trait ActivityLog: Send + Sync {
    fn append(&self, record: ActivityRecord) -> impl Future<Output = Result<()>> + Send;

    /// Every readable record, in the order they were written. Malformed rows are skipped.
    fn read_all(&self) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send;

    /// Drops every record.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;

    fn read_day(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send {
        async move {
            Ok(self
                .read_all()
                .await?
                .into_iter()
                .filter(|record| record.date() == date)
                .collect())
        }
    }
}

impl<T: Deref + Send + Sync> ActivityLog for T
where
    T::Target: ActivityLog,
{
    fn append(&self, record: ActivityRecord) -> impl Future<Output = Result<()>> + Send {
        self.deref().append(record)
    }

    fn read_all(&self) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send {
        self.deref().read_all()
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        self.deref().clear()
    }
}

/// Activity log kept as a CSV file with a header row.
pub struct CsvActivityLog {
    path: PathBuf,
}

impl CsvActivityLog {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        create_with_header(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_inner(&self, record: &ActivityRecord) -> Result<()> {
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, record).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut File, record: &ActivityRecord) -> Result<()> {
        let mut buffer = String::new();
        // The file might have been removed by a reset since it was created.
        if file.metadata().await?.len() == 0 {
            buffer.push_str(&join_row(LOG_HEADER));
            buffer.push('\n');
        }
        buffer.push_str(&to_row(record));
        buffer.push('\n');

        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_inner(&self) -> std::result::Result<Vec<ActivityRecord>, std::io::Error> {
        debug!("Reading activity log {:?}", self.path);
        let file = File::open(&self.path).await?;
        file.lock_shared()?;
        let mut lines = BufReader::new(file).lines();
        let mut records = vec![];
        let mut line_number = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line_number == 1 || line.trim().is_empty() {
                continue;
            }
            match from_row(&line) {
                Ok(record) => records.push(record),
                // Partial rows can appear after the process was killed mid-write.
                Err(e) => warn!("Skipping malformed activity row {line_number} {line:?}: {e}"),
            }
        }
        lines.into_inner().into_inner().unlock_async().await?;
        Ok(records)
    }
}

fn create_with_header(path: &Path) -> std::io::Result<()> {
    match std::fs::File::options()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(mut file) => {
            file.write_all(join_row(LOG_HEADER).as_bytes())?;
            file.write_all(b"\n")
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

fn to_row(record: &ActivityRecord) -> String {
    let timestamp = format_timestamp(record.timestamp);
    let duration = format!("{:.2}", record.duration_seconds);
    join_row([
        timestamp.as_str(),
        &record.app_name,
        &record.window_title,
        duration.as_str(),
        record.classification.as_tag(),
    ])
}

fn from_row(line: &str) -> Result<ActivityRecord> {
    let fields = split_row(line).ok_or_else(|| anyhow!("Unterminated quote"))?;
    let [timestamp, app_name, window_title, duration, classification] =
        <[String; 5]>::try_from(fields)
            .map_err(|fields| anyhow!("Expected 5 fields, found {}", fields.len()))?;

    Ok(ActivityRecord {
        timestamp: parse_timestamp(&timestamp)
            .ok_or_else(|| anyhow!("Invalid timestamp {timestamp:?}"))?,
        app_name: app_name.into(),
        window_title: window_title.into(),
        duration_seconds: duration.parse::<f64>()?.max(0.),
        classification: classification.parse::<Classification>()?,
    })
}

impl ActivityLog for CsvActivityLog {
    async fn append(&self, record: ActivityRecord) -> Result<()> {
        self.append_inner(&record).await
    }

    async fn read_all(&self) -> Result<Vec<ActivityRecord>> {
        match self.read_inner().await {
            Ok(records) => Ok(records),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        create_with_header(&self.path)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::tempdir;

    use crate::storage::entities::{ActivityRecord, Classification};

    use super::{ActivityLog, CsvActivityLog};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn record(app: &str, title: &str, offset_secs: i64, duration: f64) -> ActivityRecord {
        ActivityRecord {
            timestamp: TEST_START_DATE + Duration::seconds(offset_secs),
            app_name: app.into(),
            window_title: title.into(),
            duration_seconds: duration,
            classification: Classification::Neutral,
        }
    }

    #[tokio::test]
    async fn test_new_log_has_only_header() -> Result<()> {
        let dir = tempdir()?;
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;

        let content = std::fs::read_to_string(log.path())?;
        assert_eq!(
            content,
            "timestamp,app_name,window_title,duration_seconds,is_productive\n"
        );
        assert!(log.read_all().await?.is_empty());

        // Opening again must not repeat the header.
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;
        assert_eq!(std::fs::read_to_string(log.path())?.lines().count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_append_writes_rounded_rows() -> Result<()> {
        let dir = tempdir()?;
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;

        let mut first = record("code.exe", "main.rs - focuswatch", 5, 4.987);
        first.classification = Classification::Productive;
        log.append(first).await?;
        log.append(record("chrome.exe", "Inbox, 3 unread", 10, 5.)).await?;

        let content = std::fs::read_to_string(log.path())?;
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2018-07-04 00:00:05,code.exe,main.rs - focuswatch,4.99,True"
        );
        assert_eq!(
            lines[2],
            "2018-07-04 00:00:10,chrome.exe,\"Inbox, 3 unread\",5.00,None"
        );

        let stored = log.read_all().await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(&*stored[1].window_title, "Inbox, 3 unread");
        assert_eq!(stored[0].duration_seconds, 4.99);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;
        log.append(record("a", "a", 0, 1.)).await?;

        let mut file = std::fs::File::options().append(true).open(log.path())?;
        file.write_all(b"2018-07-04 00:00:0")?;
        drop(file);

        let stored = log.read_all().await?;
        assert_eq!(stored.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty_and_is_recreated() -> Result<()> {
        let dir = tempdir()?;
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;
        std::fs::remove_file(log.path())?;

        assert!(log.read_all().await?.is_empty());

        log.append(record("a", "a", 0, 1.)).await?;
        let content = std::fs::read_to_string(log.path())?;
        assert!(content.starts_with("timestamp,"));
        assert_eq!(log.read_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_day_and_clear() -> Result<()> {
        let dir = tempdir()?;
        let log = CsvActivityLog::new(dir.path().join("activity_log.csv"))?;
        log.append(record("a", "a", 0, 1.)).await?;
        log.append(record("b", "b", 60 * 60 * 24, 1.)).await?;

        let day = log.read_day(TEST_START_DATE.date()).await?;
        assert_eq!(day.len(), 1);
        assert_eq!(&*day[0].app_name, "a");

        log.clear().await?;
        assert!(log.read_all().await?.is_empty());
        assert_eq!(std::fs::read_to_string(log.path())?.lines().count(), 1);
        Ok(())
    }
}
