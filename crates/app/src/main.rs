use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::QuestionRecord;
use services::{
    Difficulty, GenerationParams, QuestionGenService, QuestionRepository, QuizSession,
    export_report,
};
use storage::{KeyValueStore, SqliteStore};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingFile { cmd: &'static str },
    InvalidDbUrl { raw: String },
    InvalidCount { raw: String },
    InvalidDifficulty { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingFile { cmd } => write!(f, "{cmd} requires --file <path>"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (easy|medium|hard)")
            }
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
    eprintln!("  cargo run -p app -- list     [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- play     [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- import   --file <questions.json> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- export   [--file <questions.json>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- generate --file <document.txt> [--count <3..=15>]");
    eprintln!("                               [--difficulty easy|medium|hard] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --count 5, --difficulty medium");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_AI_API_KEY, QUIZ_AI_BASE_URL, QUIZ_AI_MODEL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Play,
    Import,
    Export,
    Generate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "play" => Some(Self::Play),
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            "generate" => Some(Self::Generate),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    file: Option<String>,
    count: u8,
    difficulty: Difficulty,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut file = None;
        let mut count = 5_u8;
        let mut difficulty = Difficulty::Medium;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--file" => {
                    file = Some(require_value(args, "--file")?);
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = match value.as_str() {
                        "easy" => Difficulty::Easy,
                        "medium" => Difficulty::Medium,
                        "hard" => Difficulty::Hard,
                        _ => return Err(ArgsError::InvalidDifficulty { raw: value }),
                    };
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            file,
            count,
            difficulty,
        })
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::List,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::List,
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
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&args.db_url).await?);
    let mut repo = QuestionRepository::new(store);
    repo.hydrate().await?;

    match cmd {
        Command::List => {
            if repo.is_empty() {
                println!("No questions saved yet.");
                return Ok(());
            }
            for (i, question) in repo.questions().iter().enumerate() {
                println!("{}. {}", i + 1, question.text());
                for (j, option) in question.options().iter().enumerate() {
                    let marker = if question.is_correct(j) { "*" } else { " " };
                    println!("   {marker} {}) {option}", j + 1);
                }
            }
            Ok(())
        }
        Command::Play => run_play(&repo),
        Command::Import => {
            let path = args.file.ok_or(ArgsError::MissingFile { cmd: "import" })?;
            let text = std::fs::read_to_string(&path)?;
            let count = repo.import(&text)?;
            repo.flush().await?;
            println!("Imported {count} questions from {path}.");
            Ok(())
        }
        Command::Export => {
            let json = repo.export()?;
            match args.file {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    println!("Exported {} questions to {path}.", repo.len());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Generate => {
            let path = args.file.ok_or(ArgsError::MissingFile { cmd: "generate" })?;
            let document = std::fs::read_to_string(&path)?;

            let service = QuestionGenService::from_env();
            let params = GenerationParams::new(args.count, args.difficulty)?;
            let generated = service.generate(&document, params).await?;

            // Generated candidates go through the normal replace boundary,
            // appended after the existing list.
            let mut records: Vec<_> = repo
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect();
            records.extend(generated.iter().map(QuestionRecord::from_question));
            let added = generated.len();
            repo.replace(records)?;
            repo.flush().await?;
            println!("Added {added} generated questions ({} total).", repo.len());
            Ok(())
        }
    }
}

fn run_play(repo: &QuestionRepository) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    let mut session = QuizSession::new(repo.questions().to_vec());
    if session.total() == 0 {
        println!("No questions to play.");
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_complete() {
        let Some(question) = session.current_question() else {
            break;
        };
        let option_count = question.options().len();

        println!();
        println!(
            "Question {} / {}   score: {}",
            session.current_index() + 1,
            session.total(),
            session.score()
        );
        println!("{}", question.text());
        for (i, option) in question.options().iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            println!("Input closed; attempt abandoned.");
            return Ok(());
        };
        let line = line?;
        let Ok(choice) = line.trim().parse::<usize>() else {
            println!("Enter an option number between 1 and {option_count}.");
            continue;
        };
        if choice == 0 || choice > option_count {
            println!("Enter an option number between 1 and {option_count}.");
            continue;
        }

        session.select_option(choice - 1);
        session.submit();

        if let Some(answer) = session.answers().last() {
            if answer.was_correct {
                println!("Correct!");
            } else {
                println!("Incorrect. The right answer is: {}", answer.correct_option_text);
            }
        }
        session.advance(clock.now());
    }

    let report = session.report()?;
    println!();
    println!(
        "Finished: {} / {} ({}%)",
        report.score(),
        report.total(),
        report.percentage()
    );
    println!("{}", export_report(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
