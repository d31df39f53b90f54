use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::storage::entities::ActivityRecord;

use super::classifier::Classifier;

/// The window the user is looking at right now, since `started`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSession {
    pub app_name: Arc<str>,
    pub window_title: Arc<str>,
    pub started: NaiveDateTime,
}

/// Turns per-second samples into sessions. A sample only produces a record when the
/// app/title pair changes (or on [SessionAggregator::flush]), so consecutive identical samples
/// collapse into one row.
pub struct SessionAggregator {
    classifier: Arc<Classifier>,
    current: Option<OpenSession>,
}

impl SessionAggregator {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self {
            classifier,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&OpenSession> {
        self.current.as_ref()
    }

    /// Feeds a sample. Returns the record of the session that just ended, if any.
    pub fn observe(
        &mut self,
        app_name: Arc<str>,
        window_title: Arc<str>,
        now: NaiveDateTime,
    ) -> Option<ActivityRecord> {
        if let Some(current) = &self.current {
            if current.app_name == app_name && current.window_title == window_title {
                return None;
            }
        }

        let finished = self.finish(now);
        self.current = Some(OpenSession {
            app_name,
            window_title,
            started: now,
        });
        finished
    }

    /// Closes the open session, if there is one. Used when tracking stops.
    pub fn flush(&mut self, now: NaiveDateTime) -> Option<ActivityRecord> {
        self.finish(now)
    }

    fn finish(&mut self, now: NaiveDateTime) -> Option<ActivityRecord> {
        let session = self.current.take()?;
        let duration = (now - session.started).num_milliseconds().max(0) as f64 / 1000.;
        let classification = self
            .classifier
            .classify(&session.app_name, &session.window_title);
        Some(ActivityRecord {
            timestamp: now,
            app_name: session.app_name,
            window_title: session.window_title,
            duration_seconds: duration,
            classification,
        })
    }
}
