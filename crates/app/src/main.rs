use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use exam_core::model::Field;
use exam_core::time::{format_exam_time, format_study_time};
use exam_core::{Clock, ExamConfig, QuestionCatalog};
use services::{ExamApp, ExamBuilder, load_catalog, load_config};
use storage::{StateRepository, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- stats         [--db <url>] [--catalog <path>] [--config <path>]");
    eprintln!("  cargo run -p app -- check-catalog [--catalog <path>] [--config <path>]");
    eprintln!("  cargo run -p app -- reset         [--db <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://exam.sqlite3");
    eprintln!("  --catalog questions.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_CATALOG, EXAM_CONFIG, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Stats,
    CheckCatalog,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "check-catalog" => Some(Self::CheckCatalog),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    catalog: PathBuf,
    config: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://exam.sqlite3".into(), normalize_sqlite_url);
        let mut catalog = std::env::var("EXAM_CATALOG")
            .map_or_else(|_| PathBuf::from("questions.json"), PathBuf::from);
        let mut config = std::env::var("EXAM_CONFIG").ok().map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => catalog = PathBuf::from(require_value(args, "--catalog")?),
                "--config" => config = Some(PathBuf::from(require_value(args, "--config")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog,
            config,
        })
    }

    fn exam_config(&self) -> Result<ExamConfig, services::AppInitError> {
        match &self.config {
            Some(path) => load_config(path),
            None => Ok(ExamConfig::standard()),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn print_quota_report(catalog: &QuestionCatalog, config: &ExamConfig) {
    println!("catalog: {} questions", catalog.len());
    for (field, fill) in ExamBuilder::new(catalog, config).quota_report() {
        let marker = if fill.is_short() { "  (short)" } else { "" };
        println!(
            "  {field:<11} {available:>4} available, quota {quota}{marker}",
            available = fill.available,
            quota = fill.quota,
        );
    }
}

fn print_stats(app: &ExamApp) {
    let stats = app.stats();
    let progress = app.state().study_progress();

    println!("study time:     {}", format_study_time(stats.total_study_minutes));
    println!(
        "answered:       {} ({}% correct)",
        progress.answered_questions(),
        stats.overall_accuracy
    );
    println!("streak:         {} day(s)", stats.streak_days);
    println!(
        "mock exams:     {} taken, {} passed ({}%)",
        stats.exams_taken,
        stats.exams_passed,
        stats.pass_rate()
    );
    println!("best / average: {} / {}", stats.best_score, stats.average_score);

    for field in Field::ALL {
        let fp = progress.field(field);
        let weak = if fp.is_weak() { "  weak" } else { "" };
        println!(
            "  {field:<11} {answered:>4} answered, {accuracy:>3}%{weak}",
            answered = fp.answered_questions(),
            accuracy = fp.accuracy(),
        );
        if !fp.weak_categories().is_empty() {
            println!("              weak categories: {}", fp.weak_categories().join(", "));
        }
    }

    if let Some(latest) = app.state().latest_exam_result() {
        println!(
            "latest exam:    {} ({}) in {}",
            latest.score(),
            if latest.passed() { "pass" } else { "fail" },
            format_exam_time(latest.time_spent_secs())
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Stats,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Stats,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let skip = usize::from(argv.first().is_some_and(|first| !first.starts_with("--")));
    let mut iter = argv.into_iter().skip(skip);
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let config = parsed.exam_config()?;

    match cmd {
        Command::CheckCatalog => {
            let catalog = load_catalog(&parsed.catalog)?;
            print_quota_report(&catalog, &config);
            Ok(())
        }
        Command::Stats => {
            let catalog = Arc::new(load_catalog(&parsed.catalog)?);
            prepare_sqlite_file(&parsed.db_url)?;
            let app = ExamApp::new_sqlite(&parsed.db_url, catalog, config, Clock::system()).await?;
            print_stats(&app);
            Ok(())
        }
        Command::Reset => {
            prepare_sqlite_file(&parsed.db_url)?;
            let storage = Storage::sqlite(&parsed.db_url).await?;
            StateRepository::from_storage(&storage).clear().await;
            println!("progress reset ({})", parsed.db_url);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "command failed");
        std::process::exit(2);
    }
}
