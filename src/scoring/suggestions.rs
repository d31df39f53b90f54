//! Plain-language hints derived from the last week. These are heuristics, an empty list is a
//! valid answer.

use super::daily::AppUsage;

pub const TRENDING_UP: &str = "Your productivity is trending upward. Keep up the good work!";
pub const TRENDING_DOWN: &str =
    "Your productivity has been declining. Try to focus on more productive tasks.";
pub const TRY_POMODORO: &str =
    "Try using the Pomodoro technique to improve focus and productivity.";

/// Minimal number of scored days before a trend is reported.
const MIN_TREND_DAYS: usize = 3;

/// Unproductive time on a single app (in hours) worth pointing out.
const DISTRACTION_HOURS: f64 = 1.;

/// Average score under which the generic technique hint is given.
const LOW_AVERAGE_SCORE: f64 = 50.;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn trend(scores: &[f64]) -> Option<&'static str> {
    if scores.len() < MIN_TREND_DAYS {
        return None;
    }
    // Chronological on purpose: scores rising over time read as upward. Comparing the halves of
    // a newest-first list would report the opposite. With an odd count the middle day is newer.
    let (older, newer) = scores.split_at(scores.len() / 2);
    let (older, newer) = (mean(older), mean(newer));
    if newer > older {
        Some(TRENDING_UP)
    } else if newer < older {
        Some(TRENDING_DOWN)
    } else {
        None
    }
}

fn top_distraction(unproductive: &[AppUsage]) -> Option<String> {
    let top = unproductive
        .iter()
        .max_by(|a, b| a.seconds.total_cmp(&b.seconds))?;
    let hours = top.seconds / 3600.;
    (hours > DISTRACTION_HOURS).then(|| {
        format!(
            "You spent {hours:.1} hours on {}. Consider limiting time on this app.",
            top.app_name
        )
    })
}

/// `scores` are the cached scores of the window, oldest first. `unproductive` is unproductive
/// time per app over the same window.
pub fn generate(scores: &[f64], unproductive: &[AppUsage]) -> Vec<String> {
    let mut suggestions = vec![];

    if let Some(message) = trend(scores) {
        suggestions.push(message.to_string());
    }

    if let Some(message) = top_distraction(unproductive) {
        suggestions.push(message);
    }

    if scores.is_empty() || mean(scores) < LOW_AVERAGE_SCORE {
        suggestions.push(TRY_POMODORO.to_string());
    }

    suggestions
}
