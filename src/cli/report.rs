use ansi_term::{Colour, Style};

use crate::{
    scoring::{daily::DailySummary, WeeklyAnalysis},
    storage::entities::{Classification, DailyScoreRecord},
    utils::time::{format_date, format_seconds},
};

use super::console::paint_classification;

fn paint_score(score: f64) -> String {
    let colour = if score >= 70. {
        Colour::Green
    } else if score >= 50. {
        Colour::Yellow
    } else {
        Colour::Red
    };
    colour.bold().paint(format!("{score:.1}")).to_string()
}

pub fn print_daily_score(record: &DailyScoreRecord) {
    println!("{}\t{}", format_date(record.date), paint_score(record.score));
    println!(
        "{}\t{}",
        paint_classification(Classification::Productive),
        format_seconds(record.productive_time)
    );
    println!(
        "{}\t{}",
        paint_classification(Classification::Unproductive),
        format_seconds(record.unproductive_time)
    );
    println!(
        "{}\t{}",
        paint_classification(Classification::Neutral),
        format_seconds(record.neutral_time)
    );
    println!("Total\t{}", format_seconds(record.total_time));
}

pub fn print_streak(streak: u32) {
    println!("Streak\t{streak} day(s)");
}

pub fn print_weekly_analysis(analysis: &WeeklyAnalysis) {
    let header = Style::new().bold();
    println!(
        "{}",
        header.paint("Date\t\tScore\tProductive\tUnproductive")
    );
    for day in &analysis.days {
        println!(
            "{}\t{}\t{:.1}h\t\t{:.1}h",
            format_date(day.date),
            paint_score(day.score),
            day.productive_hours,
            day.unproductive_hours
        );
    }
    println!();
    println!("Average\t{}", paint_score(analysis.average_score));
    print_streak(analysis.streak);
    if let Some(day) = analysis.most_productive_day {
        println!("Best day\t{}", format_date(day));
    }

    if !analysis.suggestions.is_empty() {
        println!();
        for suggestion in &analysis.suggestions {
            println!("- {suggestion}");
        }
    }
}

pub fn print_daily_summary(summary: &DailySummary) {
    println!(
        "{}\t{}\t{} productive",
        format_date(summary.date),
        format_seconds(summary.total_time),
        summary.productive_percentage
    );
    println!(
        "{}\t{}",
        paint_classification(Classification::Productive),
        format_seconds(summary.productive_time)
    );
    println!(
        "{}\t{}",
        paint_classification(Classification::Unproductive),
        format_seconds(summary.unproductive_time)
    );
    if summary.top_apps.is_empty() {
        return;
    }
    println!();
    for usage in &summary.top_apps {
        println!("{}\t{}", format_seconds(usage.seconds), usage.app_name);
    }
}
