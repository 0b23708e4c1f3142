mod args;
mod onboard;
mod quiz;
mod term;

use services::{AppServices, Clock, QuizOptions};
use tracing_subscriber::EnvFilter;
use tutor_core::bank::QuestionBank;
use tutor_core::model::QuizSettings;

use args::{Args, ArgsError, Command, ProcessEnv, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TUTOR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the interactive prompts
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_bank(args: &Args) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    match &args.bank {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let bank = QuestionBank::from_reader(std::io::BufReader::new(file))?;
            tracing::info!(path = %path.display(), questions = bank.len(), "question bank loaded");
            Ok(bank)
        }
        None => Ok(QuestionBank::builtin()),
    }
}

fn quiz_settings(args: &Args) -> Result<QuizSettings, Box<dyn std::error::Error>> {
    let settings = QuizSettings::default();
    Ok(match args.time_limit_minutes {
        Some(minutes) => settings.with_time_limit(minutes)?,
        None => settings,
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), &ProcessEnv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    init_tracing();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::default_clock(),
        load_bank(&parsed)?,
        quiz_settings(&parsed)?,
    )
    .await?;

    match parsed.command {
        Command::Quiz => {
            let options = QuizOptions {
                count: parsed.count,
                difficulty: parsed.difficulty,
                ..QuizOptions::default()
            };
            quiz::run_quiz(&services, parsed.user_id, options, parsed.seed).await
        }
        Command::Onboard => onboard::run_onboarding(&services, parsed.user_id).await,
        Command::Results => print_results(&services, &parsed).await,
        Command::Help => Ok(()),
    }
}

async fn print_results(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = services
        .quiz_results()
        .list_recent(args.user_id, args.limit)
        .await?;
    if items.is_empty() {
        println!("No quiz results for user {} yet.", args.user_id);
        return Ok(());
    }
    for item in items {
        println!(
            "#{:<4} {}  {:>3}/{:<3} {:>3}%  {:<15} {:<9} {}",
            item.id,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.score,
            item.total,
            item.percentage,
            item.band.label(),
            item.reason.as_str(),
            item.title
        );
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
