//! User configuration. Loaded once at startup from `config.toml` inside the application
//! directory and handed to every component that needs it.
//!
//! Every field has a default, so a partial file (or no file at all) is a valid configuration.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ACTIVITY_LOG_FILE_NAME: &str = "activity_log.csv";
pub const SCORE_CACHE_FILE_NAME: &str = "focus_scores.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub productive_apps: Vec<String>,
    pub unproductive_apps: Vec<String>,
    pub productive_websites: Vec<String>,
    pub unproductive_websites: Vec<String>,
    /// Process names whose window titles are searched for websites.
    pub browsers: Vec<String>,
    /// Continuous unproductive time after which an alert is raised.
    pub unproductive_threshold_secs: u64,
    /// Whether desktop notifications are shown. Alerts are still logged when disabled.
    pub notifications: bool,
    /// Where the activity log and score cache live. Defaults to `<app dir>/data`.
    pub data_dir: Option<PathBuf>,
    pub pomodoro: PomodoroConfig,
    pub score: ScoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PomodoroConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub cycles_before_long_break: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    pub productive_weight: f64,
    pub unproductive_weight: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Minimal score for a day to count towards the streak.
    pub streak_threshold: f64,
    /// Days with less tracked time than this score 0.
    pub min_tracked_secs: f64,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            productive_apps: strings(&[
                "code.exe",
                "pycharm64.exe",
                "idea64.exe",
                "excel.exe",
                "word.exe",
                "powerpoint.exe",
                "outlook.exe",
                "onenote.exe",
                "notepad.exe",
                "notepad++.exe",
                "cmd.exe",
                "powershell.exe",
                "WindowsTerminal.exe",
                // Browsers count as work unless the title points to a known website.
                "chrome.exe",
                "msedge.exe",
                "firefox.exe",
            ]),
            unproductive_apps: strings(&[
                "discord.exe",
                "slack.exe",
                "spotify.exe",
                "steam.exe",
                "epicgameslauncher.exe",
                "vlc.exe",
                "netflix.exe",
                "msn.exe",
                "telegram.exe",
                "whatsapp.exe",
            ]),
            productive_websites: strings(&[
                "github.com",
                "stackoverflow.com",
                "docs.python.org",
                "linkedin.com",
                "udemy.com",
                "coursera.org",
                "edx.org",
                "kaggle.com",
            ]),
            unproductive_websites: strings(&[
                "facebook.com",
                "twitter.com",
                "instagram.com",
                "reddit.com",
                "youtube.com",
                "netflix.com",
                "tiktok.com",
                "twitch.tv",
            ]),
            browsers: strings(&[
                "chrome.exe",
                "msedge.exe",
                "firefox.exe",
                "opera.exe",
                "brave.exe",
                "safari.exe",
            ]),
            unproductive_threshold_secs: 60,
            notifications: true,
            data_dir: None,
            pomodoro: PomodoroConfig::default(),
            score: ScoreConfig::default(),
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 10,
            short_break_minutes: 5,
            long_break_minutes: 15,
            cycles_before_long_break: 4,
        }
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            productive_weight: 0.7,
            unproductive_weight: 0.3,
            min_score: 0.,
            max_score: 100.,
            streak_threshold: 50.,
            min_tracked_secs: 60.,
        }
    }
}

impl ScoreConfig {
    /// Replaces score bounds that can't be used (inverted, or not finite) with the defaults.
    fn validated(mut self) -> Self {
        let usable = self.min_score.is_finite()
            && self.max_score.is_finite()
            && self.min_score <= self.max_score;
        if !usable {
            let defaults = Self::default();
            warn!(
                "Invalid score bounds [{}, {}], using [{}, {}]",
                self.min_score, self.max_score, defaults.min_score, defaults.max_score
            );
            self.min_score = defaults.min_score;
            self.max_score = defaults.max_score;
        }
        self
    }
}

impl PomodoroConfig {
    pub fn work_duration(&self) -> u32 {
        self.work_minutes * 60
    }

    pub fn short_break_duration(&self) -> u32 {
        self.short_break_minutes * 60
    }

    pub fn long_break_duration(&self) -> u32 {
        self.long_break_minutes * 60
    }
}

impl Config {
    pub fn unproductive_threshold(&self) -> Duration {
        Duration::from_secs(self.unproductive_threshold_secs)
    }

    pub fn data_dir(&self, application_dir: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| application_dir.join("data"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.score = config.score.validated();
        Ok(config)
    }

    /// Reads `config.toml` from the application directory. A missing file produces the default
    /// configuration, which is also written out so it can be edited.
    pub fn load_or_default(application_dir: &Path) -> Result<Self> {
        let path = application_dir.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::parse(&content)?;
                info!("Loaded configuration from {path:?}");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let config = Self::default();
                if let Err(e) = config.write(&path) {
                    warn!("Couldn't write default configuration to {path:?}: {e:?}");
                }
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
