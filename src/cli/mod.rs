pub mod console;
pub mod controls;
pub mod daemon_path;
pub mod process;
pub mod report;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use console::{paint_classification, ConsoleListener};
use controls::{control_timer, stdin_lines, CONTROLS_HELP};
use process::{daemon_executable, kill_previous_servers, restart_server};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    config::{Config, ACTIVITY_LOG_FILE_NAME, SCORE_CACHE_FILE_NAME},
    daemon::{create_notifier, serve, shutdown::detect_shutdown, ServeOptions},
    notify::NOTIFICATION_TIMEOUT,
    pomodoro::service::PomodoroService,
    scoring::FocusScoreEngine,
    storage::{activity_log::CsvActivityLog, score_store::JsonScoreStore},
    tracking::{
        alert::{alert_message, ALERT_TITLE},
        classifier::Classifier,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "focuswatch", version, long_about = None)]
#[command(about = "Tracks what you focus on, scores your day and keeps a Pomodoro timer", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
struct DateArg {
    #[arg(
        long,
        short,
        help = "Day to look at. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl DateArg {
    fn resolve(&self) -> Result<NaiveDate> {
        let now = Local::now();
        match &self.date {
            None => Ok(now.date_naive()),
            Some(value) => match parse_date_string(value, now, self.date_style.into()) {
                Ok(v) => Ok(v.with_timezone(&Local).date_naive()),
                Err(e) => Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Failed to validate date {e}"),
                    )
                    .into()),
            },
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {},
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Track activity in the current console until Ctrl-C")]
    Serve {
        #[arg(long, help = "Also run the Pomodoro timer")]
        pomodoro: bool,
        #[arg(long = "no-notify", help = "Don't show desktop notifications")]
        no_notify: bool,
    },
    #[command(
        about = "Run only the Pomodoro timer in the current console until Ctrl-C or q. Type p to pause and r to resume"
    )]
    Pomodoro {
        #[arg(long = "no-notify", help = "Don't show desktop notifications")]
        no_notify: bool,
    },
    #[command(about = "Display the focus score of a day")]
    Score {
        #[command(flatten)]
        date: DateArg,
    },
    #[command(about = "Display the number of consecutive days with a good score")]
    Streak {},
    #[command(about = "Display scores of the last 7 days with suggestions")]
    Week {},
    #[command(about = "Display totals and the most used apps of a day")]
    Summary {
        #[command(flatten)]
        date: DateArg,
    },
    #[command(about = "Show how an app and window title are classified")]
    Classify { app: String, title: String },
    #[command(about = "Forget the cached score of a day so it is computed again")]
    Invalidate {
        #[command(flatten)]
        date: DateArg,
    },
    #[command(about = "Delete the activity log and all cached scores")]
    Reset {
        #[arg(long, help = "Confirm deleting all data")]
        yes: bool,
    },
    #[command(about = "Send the unproductive time notification once")]
    AlertTest {},
}

type Engine = FocusScoreEngine<CsvActivityLog, JsonScoreStore>;

async fn open_engine(app_dir: &Path, config: &Config) -> Result<Engine> {
    let data_dir = config.data_dir(app_dir);
    let log = CsvActivityLog::new(data_dir.join(ACTIVITY_LOG_FILE_NAME))?;
    let store = JsonScoreStore::new(data_dir.join(SCORE_CACHE_FILE_NAME))?;
    Ok(FocusScoreEngine::load(&config.score, log, store, Box::new(DefaultClock)).await)
}

async fn run_pomodoro(config: &Config, notifications: bool) {
    let mut service = PomodoroService::new(
        &config.pomodoro,
        Arc::new(ConsoleListener),
        create_notifier(config.notifications && notifications),
        Arc::new(DefaultClock),
    );
    service.start().await;
    println!("{CONTROLS_HELP}");

    let shutdown = CancellationToken::new();
    tokio::select! {
        _ = detect_shutdown(shutdown.clone()) => {}
        quit = control_timer(&service, stdin_lines()) => {
            // Without input the timer runs until a signal.
            if !quit {
                detect_shutdown(shutdown).await;
            }
        }
    }
    service.stop().await;
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;
    let config = Config::load_or_default(&app_dir)?;

    match args.commands {
        Commands::Init {} => {
            restart_server(&app_dir)?;
            println!("Daemon started");
            Ok(())
        }
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            println!("Stopped {stopped} daemon(s)");
            Ok(())
        }
        Commands::Serve {
            pomodoro,
            no_notify,
        } => {
            serve(
                app_dir,
                ServeOptions {
                    pomodoro,
                    notifications: !no_notify,
                    listener: Arc::new(ConsoleListener),
                },
            )
            .await
        }
        Commands::Pomodoro { no_notify } => {
            run_pomodoro(&config, !no_notify).await;
            Ok(())
        }
        Commands::Score { date } => {
            let date = date.resolve()?;
            let mut engine = open_engine(&app_dir, &config).await?;
            match engine.daily_record(date).await {
                Some(record) => report::print_daily_score(&record),
                None => println!("No data for {date}"),
            }
            Ok(())
        }
        Commands::Streak {} => {
            let mut engine = open_engine(&app_dir, &config).await?;
            // Today only counts once it has a score.
            engine.calculate_daily_score(Local::now().date_naive()).await;
            report::print_streak(engine.get_streak());
            Ok(())
        }
        Commands::Week {} => {
            let mut engine = open_engine(&app_dir, &config).await?;
            report::print_weekly_analysis(&engine.get_weekly_analysis().await);
            Ok(())
        }
        Commands::Summary { date } => {
            let date = date.resolve()?;
            let engine = open_engine(&app_dir, &config).await?;
            match engine.daily_summary(date).await {
                Some(summary) => report::print_daily_summary(&summary),
                None => println!("No data for {date}"),
            }
            Ok(())
        }
        Commands::Classify { app, title } => {
            let classification = Classifier::new(&config).classify(&app, &title);
            println!("{}", paint_classification(classification));
            Ok(())
        }
        Commands::Invalidate { date } => {
            let date = date.resolve()?;
            let mut engine = open_engine(&app_dir, &config).await?;
            if engine.invalidate(date).await {
                println!("Score for {date} will be computed again");
            } else {
                println!("No cached score for {date}");
            }
            Ok(())
        }
        Commands::Reset { yes } => {
            if !yes {
                return Err(anyhow!("Refusing to delete all data without --yes"));
            }
            let mut engine = open_engine(&app_dir, &config).await?;
            engine.reset_data().await?;
            println!("All data was deleted");
            Ok(())
        }
        Commands::AlertTest {} => {
            info!("Sending test alert");
            create_notifier(config.notifications).notify(
                ALERT_TITLE,
                &alert_message(config.unproductive_threshold()),
                NOTIFICATION_TIMEOUT,
            );
            Ok(())
        }
    }
}
