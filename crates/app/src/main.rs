use std::fmt;

use revise_core::model::{ChapterId, ChapterPatch, QuizId, SubjectId};
use revise_core::time::format_duration;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidSubject { raw: String },
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubject { raw } => write!(
                f,
                "invalid --subject value: {raw} (expected economie, sociologie or science-politique)"
            ),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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
    eprintln!("  cargo run -p app -- stats   [--db <sqlite_url>] [--limit <n>]");
    eprintln!("  cargo run -p app -- chapter --subject <s> --chapter <id> [--seconds <n>] [--completed <true|false>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- quiz    --subject <s> --quiz <id> --score <0-100> [--completed] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- reset   [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:revise.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REVISE_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Stats,
    Chapter,
    Quiz,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "chapter" => Some(Self::Chapter),
            "quiz" => Some(Self::Quiz),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

fn default_db_url() -> String {
    std::env::var("REVISE_DB_URL")
        .ok()
        .map_or_else(|| "sqlite://revise.sqlite3".into(), normalize_sqlite_url)
}

struct StatsArgs {
    db_url: String,
    limit: usize,
}

struct ChapterArgs {
    db_url: String,
    subject: SubjectId,
    chapter: ChapterId,
    seconds: u64,
    completed: Option<bool>,
}

struct QuizArgs {
    db_url: String,
    subject: SubjectId,
    quiz: QuizId,
    score: u8,
    completed: bool,
}

fn parse_subject(raw: &str) -> Result<SubjectId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidSubject { raw: raw.to_string() })
}

fn parse_stats(args: &mut impl Iterator<Item = String>) -> Result<StatsArgs, ArgsError> {
    let mut db_url = default_db_url();
    let mut limit = 5_usize;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db_value(args)?,
            "--limit" => {
                let value = require_value(args, "--limit")?;
                limit = value.parse().map_err(|_| ArgsError::InvalidValue {
                    flag: "--limit",
                    raw: value.clone(),
                })?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(StatsArgs { db_url, limit })
}

fn parse_chapter(args: &mut impl Iterator<Item = String>) -> Result<ChapterArgs, ArgsError> {
    let mut db_url = default_db_url();
    let mut subject = None;
    let mut chapter = None;
    let mut seconds = 0_u64;
    let mut completed = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db_value(args)?,
            "--subject" => {
                let value = require_value(args, "--subject")?;
                subject = Some(parse_subject(&value)?);
            }
            "--chapter" => {
                let value = require_value(args, "--chapter")?;
                chapter = Some(ChapterId::new(value));
            }
            "--seconds" => {
                let value = require_value(args, "--seconds")?;
                seconds = value.parse().map_err(|_| ArgsError::InvalidValue {
                    flag: "--seconds",
                    raw: value.clone(),
                })?;
            }
            "--completed" => {
                let value = require_value(args, "--completed")?;
                completed = Some(match value.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(ArgsError::InvalidValue {
                            flag: "--completed",
                            raw: value,
                        });
                    }
                });
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(ChapterArgs {
        db_url,
        subject: subject.ok_or(ArgsError::MissingFlag { flag: "--subject" })?,
        chapter: chapter.ok_or(ArgsError::MissingFlag { flag: "--chapter" })?,
        seconds,
        completed,
    })
}

fn parse_quiz(args: &mut impl Iterator<Item = String>) -> Result<QuizArgs, ArgsError> {
    let mut db_url = default_db_url();
    let mut subject = None;
    let mut quiz = None;
    let mut score = None;
    let mut completed = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db_value(args)?,
            "--subject" => {
                let value = require_value(args, "--subject")?;
                subject = Some(parse_subject(&value)?);
            }
            "--quiz" => {
                let value = require_value(args, "--quiz")?;
                quiz = Some(QuizId::new(value));
            }
            "--score" => {
                let value = require_value(args, "--score")?;
                score = Some(value.parse().map_err(|_| ArgsError::InvalidValue {
                    flag: "--score",
                    raw: value.clone(),
                })?);
            }
            "--completed" => completed = true,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(QuizArgs {
        db_url,
        subject: subject.ok_or(ArgsError::MissingFlag { flag: "--subject" })?,
        quiz: quiz.ok_or(ArgsError::MissingFlag { flag: "--quiz" })?,
        score: score.ok_or(ArgsError::MissingFlag { flag: "--score" })?,
        completed,
    })
}

fn parse_db_only(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let mut db_url = default_db_url();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db_value(args)?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(db_url)
}

fn parse_db_value(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

async fn open_services(db_url: &str) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(AppServices::new_sqlite(db_url, Clock::default_clock()).await?)
}

async fn run_stats(parsed: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&parsed.db_url).await?;
    let progress = services.progress();

    println!(
        "Overall progress: {}%  (time studied: {})",
        progress.overall_progress(),
        format_duration(progress.total_time_spent())
    );
    println!();

    for row in progress.subject_overviews() {
        println!(
            "  {:<18} {:>3}%  chapters {}/{}  quizzes {}/{}  {}",
            row.subject.as_str(),
            row.overall_progress,
            row.chapters_completed,
            row.chapters_total,
            row.quizzes_completed,
            row.quizzes_total,
            format_duration(row.time_spent),
        );
    }

    let feed = progress.recent_activities(parsed.limit);
    if !feed.is_empty() {
        println!();
        println!("Recent activity:");
        for entry in feed {
            println!(
                "  [{}] {}/{} — {}",
                entry.kind.as_str(),
                entry.subject.as_str(),
                entry.id,
                entry.timestamp.to_rfc3339(),
            );
        }
    }

    Ok(())
}

async fn run_chapter(parsed: ChapterArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&parsed.db_url).await?;
    let progress = services.progress();

    // Same contract as a chapter page: read the stored total, add this
    // session's seconds, submit the sum.
    let previous = progress
        .chapter_progress(parsed.subject, &parsed.chapter)
        .map_or(0, |record| record.time_spent);

    let mut patch = ChapterPatch::new().with_time_spent(previous + parsed.seconds);
    if let Some(completed) = parsed.completed {
        patch = patch.with_completed(completed);
    }
    progress
        .update_chapter_progress(parsed.subject, &parsed.chapter, patch)
        .await;

    if let Some(record) = progress.chapter_progress(parsed.subject, &parsed.chapter) {
        println!(
            "{}/{}: {} studied, completed: {}",
            parsed.subject.as_str(),
            parsed.chapter,
            format_duration(record.time_spent),
            record.completed,
        );
    }

    Ok(())
}

async fn run_quiz(parsed: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&parsed.db_url).await?;
    let progress = services.progress();

    progress
        .update_quiz_progress(parsed.subject, &parsed.quiz, parsed.score, parsed.completed)
        .await;

    if let Some(record) = progress.quiz_progress(parsed.subject, &parsed.quiz) {
        println!(
            "{}/{}: score {}%, attempts {}, completed: {}",
            parsed.subject.as_str(),
            parsed.quiz,
            record.score,
            record.attempts,
            record.completed,
        );
    }

    Ok(())
}

async fn run_reset(db_url: String) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&db_url).await?;
    services.progress().reset().await;
    println!("Progress cleared.");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show stats when no subcommand is provided.
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

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let outcome = match cmd {
        Command::Stats => match parse_stats(&mut iter) {
            Ok(parsed) => run_stats(parsed).await,
            Err(e) => Err(report_args_error(e)),
        },
        Command::Chapter => match parse_chapter(&mut iter) {
            Ok(parsed) => run_chapter(parsed).await,
            Err(e) => Err(report_args_error(e)),
        },
        Command::Quiz => match parse_quiz(&mut iter) {
            Ok(parsed) => run_quiz(parsed).await,
            Err(e) => Err(report_args_error(e)),
        },
        Command::Reset => match parse_db_only(&mut iter) {
            Ok(db_url) => run_reset(db_url).await,
            Err(e) => Err(report_args_error(e)),
        },
    };

    outcome
}

fn report_args_error(e: ArgsError) -> Box<dyn std::error::Error> {
    eprintln!("{e}");
    print_usage();
    Box::new(e)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
