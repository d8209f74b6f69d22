use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{ChapterId, DEFAULT_KEY_NAMESPACE, DEFAULT_PAGE_SIZE};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPageSize { raw: String },
    InvalidDbUrl { raw: String },
    InvalidChapter { raw: String },
    InvalidNamespace { raw: String },
    MissingContent,
    MissingChapter,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPageSize { raw } => write!(f, "invalid --page-size value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidChapter { raw } => write!(f, "invalid --chapter value: {raw:?}"),
            ArgsError::InvalidNamespace { raw } => write!(f, "invalid --namespace value: {raw:?}"),
            ArgsError::MissingContent => write!(f, "--content (or QUIZ_CONTENT) is required"),
            ArgsError::MissingChapter => write!(f, "--chapter is required"),
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

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   --content <chapter.json> [--db <sqlite_url>] [--page-size <n>] [--namespace <ns>]");
    eprintln!("  cargo run -p app -- clear --chapter <id> [--db <sqlite_url>] [--namespace <ns>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --page-size {DEFAULT_PAGE_SIZE}");
    eprintln!("  --namespace {DEFAULT_KEY_NAMESPACE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CONTENT, QUIZ_PAGE_SIZE, QUIZ_NAMESPACE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Clear,
}

impl Command {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub db_url: String,
    pub content: Option<PathBuf>,
    pub chapter: Option<ChapterId>,
    pub page_size: usize,
    pub namespace: String,
}

impl Args {
    fn from_env() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("quiz.sqlite3".into()), normalize_sqlite_url),
            content: std::env::var_os("QUIZ_CONTENT").map(PathBuf::from),
            chapter: None,
            page_size: std::env::var("QUIZ_PAGE_SIZE")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            namespace: std::env::var("QUIZ_NAMESPACE")
                .ok()
                .and_then(|ns| normalize_namespace(&ns))
                .unwrap_or_else(|| DEFAULT_KEY_NAMESPACE.to_owned()),
        }
    }

    pub fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--content" => {
                    parsed.content = Some(PathBuf::from(require_value(args, "--content")?));
                }
                "--chapter" => {
                    let value = require_value(args, "--chapter")?;
                    let chapter = ChapterId::new(&value)
                        .map_err(|_| ArgsError::InvalidChapter { raw: value.clone() })?;
                    parsed.chapter = Some(chapter);
                }
                "--page-size" => {
                    let value = require_value(args, "--page-size")?;
                    parsed.page_size = value
                        .parse::<usize>()
                        .ok()
                        .filter(|size| *size > 0)
                        .ok_or_else(|| ArgsError::InvalidPageSize { raw: value.clone() })?;
                }
                "--namespace" => {
                    let value = require_value(args, "--namespace")?;
                    parsed.namespace = normalize_namespace(&value)
                        .ok_or_else(|| ArgsError::InvalidNamespace { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match cmd {
            Command::Run if parsed.content.is_none() => Err(ArgsError::MissingContent),
            Command::Clear if parsed.chapter.is_none() => Err(ArgsError::MissingChapter),
            _ => Ok(parsed),
        }
    }
}

/// Storage keys are built from the trimmed namespace; blank means unset.
fn normalize_namespace(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

pub fn normalize_sqlite_url(raw: String) -> String {
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

/// Make sure the database file and its directory exist before connecting.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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
