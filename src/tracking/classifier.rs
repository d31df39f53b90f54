use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::{config::Config, storage::entities::Classification};

/// Site names that show up in browser titles, mapped to the domain they stand for. Checked in
/// order, first match wins.
const KNOWN_SITES: [(&str, &str); 17] = [
    ("facebook", "facebook.com"),
    ("twitter", "twitter.com"),
    ("x.com", "twitter.com"),
    ("instagram", "instagram.com"),
    ("reddit", "reddit.com"),
    ("youtube", "youtube.com"),
    ("netflix", "netflix.com"),
    ("tiktok", "tiktok.com"),
    ("twitch", "twitch.tv"),
    ("github", "github.com"),
    ("stackoverflow", "stackoverflow.com"),
    ("stack overflow", "stackoverflow.com"),
    ("linkedin", "linkedin.com"),
    ("udemy", "udemy.com"),
    ("coursera", "coursera.org"),
    ("edx", "edx.org"),
    ("kaggle", "kaggle.com"),
];

/// Domain-like tokens in a title: a bare URL first, then a domain between `-`/`|` separators,
/// then one at the end after a separator.
static DOMAIN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:https?://)?(?:www\.)?([a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+)",
        r"(?:.*?)(?:[-|]\s*)((?:www\.)?[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+)(?:\s*[-|])",
        r"(?:.*?)(?:[-|]\s*)((?:www\.)?[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+)(?:\s*)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("domain patterns are valid"))
    .collect()
});

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// Decides whether an application window is productive. Rules come from [Config] and are
/// normalized to lower case once, at construction.
#[derive(Debug, Clone)]
pub struct Classifier {
    productive_apps: HashSet<String>,
    unproductive_apps: HashSet<String>,
    productive_websites: Vec<String>,
    unproductive_websites: Vec<String>,
    browsers: HashSet<String>,
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Self {
            productive_apps: lowercase_all(&config.productive_apps).into_iter().collect(),
            unproductive_apps: lowercase_all(&config.unproductive_apps)
                .into_iter()
                .collect(),
            productive_websites: lowercase_all(&config.productive_websites),
            unproductive_websites: lowercase_all(&config.unproductive_websites),
            browsers: lowercase_all(&config.browsers).into_iter().collect(),
        }
    }

    pub fn is_browser(&self, app_name: &str) -> bool {
        self.browsers.contains(&app_name.to_lowercase())
    }

    /// Looks for a website in the title of a browser window. Returns `None` for other apps.
    pub fn extract_website(&self, app_name: &str, window_title: &str) -> Option<String> {
        if window_title.is_empty() || !self.is_browser(app_name) {
            return None;
        }

        let title = window_title.to_lowercase();
        if let Some((_, domain)) = KNOWN_SITES.iter().find(|(site, _)| title.contains(site)) {
            debug!("Website detected: {domain} (from title: {window_title})");
            return Some(domain.to_string());
        }

        let domain = DOMAIN_PATTERNS.iter().find_map(|pattern| {
            pattern
                .captures(window_title)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_lowercase())
        })?;
        debug!("Website detected: {domain} (from title: {window_title})");
        Some(domain)
    }

    fn match_website(&self, text: &str) -> Option<Classification> {
        if self.productive_websites.iter().any(|site| text.contains(site)) {
            Some(Classification::Productive)
        } else if self.unproductive_websites.iter().any(|site| text.contains(site)) {
            Some(Classification::Unproductive)
        } else {
            None
        }
    }

    /// Browser websites are checked first, then the app lists, then website names anywhere in
    /// the title. Productive rules win over unproductive ones at every step.
    pub fn classify(&self, app_name: &str, window_title: &str) -> Classification {
        let app_name = app_name.to_lowercase();

        if let Some(website) = self.extract_website(&app_name, window_title) {
            match self.match_website(&website) {
                Some(classification) => {
                    debug!("{classification} website detected: {website}");
                    return classification;
                }
                None => debug!("Uncategorized website detected: {website}"),
            }
        }

        if self.productive_apps.contains(&app_name) {
            return Classification::Productive;
        }
        if self.unproductive_apps.contains(&app_name) {
            return Classification::Unproductive;
        }

        self.match_website(&window_title.to_lowercase())
            .unwrap_or(Classification::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use crate::{config::Config, storage::entities::Classification};

    use super::Classifier;

    fn classifier() -> Classifier {
        Classifier::new(&Config::default())
    }

    #[test]
    fn test_known_site_in_browser_title() {
        let classifier = classifier();
        assert_eq!(
            classifier.extract_website("chrome.exe", "Home / X (Twitter) - Google Chrome"),
            Some("twitter.com".to_string())
        );
        assert_eq!(
            classifier.classify("chrome.exe", "Home / X (Twitter) - Google Chrome"),
            Classification::Unproductive
        );
    }

    #[test]
    fn test_browser_title_beats_productive_app_rule() {
        let classifier = classifier();
        // chrome.exe is a productive app in the default rules.
        assert_eq!(
            classifier.classify("chrome.exe", "New Tab - Google Chrome"),
            Classification::Productive
        );
        assert_eq!(
            classifier.classify("Chrome.EXE", "cats - YouTube - Google Chrome"),
            Classification::Unproductive
        );
    }

    #[test]
    fn test_productive_apps_ignore_title() {
        let classifier = classifier();
        for title in ["", "reddit.com - funny", "youtube.com watch later"] {
            assert_eq!(
                classifier.classify("code.exe", title),
                Classification::Productive
            );
        }
        assert_eq!(
            classifier.classify("WINDOWSTERMINAL.EXE", ""),
            Classification::Productive
        );
    }

    #[test]
    fn test_unproductive_apps() {
        assert_eq!(
            classifier().classify("Discord.exe", "general"),
            Classification::Unproductive
        );
    }

    #[test]
    fn test_title_scan_for_unknown_apps() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("nvim", "notes about github.com"),
            Classification::Productive
        );
        assert_eq!(
            classifier.classify("nvim", "draft for reddit.com"),
            Classification::Unproductive
        );
        assert_eq!(
            classifier.classify("nvim", "github.com vs reddit.com"),
            Classification::Productive
        );
        assert_eq!(
            classifier.classify("nvim", "main.rs"),
            Classification::Neutral
        );
    }

    #[test]
    fn test_regex_domain_extraction() {
        let classifier = classifier();
        assert_eq!(
            classifier.extract_website("firefox.exe", "https://www.Docs.Python.org/3/ - Mozilla Firefox"),
            Some("docs.python.org".to_string())
        );
        assert_eq!(
            classifier.classify("firefox.exe", "Library - docs.python.org - Mozilla Firefox"),
            Classification::Productive
        );
        assert_eq!(
            classifier.extract_website("opera.exe", "Speed Dial"),
            None
        );
        // Not a browser, no extraction at all.
        assert_eq!(classifier.extract_website("nvim", "github.com"), None);
    }

    #[test]
    fn test_uncategorized_website_falls_back_to_app_rules() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("brave.exe", "rust-lang.org - Brave"),
            Classification::Neutral
        );
        assert_eq!(
            classifier.classify("msedge.exe", "rust-lang.org - Edge"),
            Classification::Productive
        );
    }

    #[test]
    fn test_productive_website_wins_ties() {
        let mut config = Config::default();
        config.unproductive_websites.push("github.com".into());
        let classifier = Classifier::new(&config);
        assert_eq!(
            classifier.classify("opera.exe", "pulls - GitHub"),
            Classification::Productive
        );
    }
}
