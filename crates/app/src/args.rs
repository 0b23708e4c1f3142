use std::fmt;
use std::path::PathBuf;

use tutor_core::model::{Difficulty, UserId};

pub const DEFAULT_DB_URL: &str = "sqlite://tutor.sqlite3";
pub const DEFAULT_RESULTS_LIMIT: u32 = 10;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidCount { raw: String },
    InvalidDifficulty { raw: String },
    InvalidTimeLimit { raw: String },
    InvalidLimit { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value (easy|medium|hard): {raw}")
            }
            ArgsError::InvalidTimeLimit { raw } => {
                write!(f, "invalid --time-limit value (minutes): {raw}")
            }
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quiz,
    Onboard,
    Results,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "onboard" => Some(Self::Onboard),
            "results" => Some(Self::Results),
            "help" | "--help" | "-h" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Environment lookups, injectable for tests.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub user_id: UserId,
    pub count: Option<usize>,
    pub difficulty: Option<Difficulty>,
    pub bank: Option<PathBuf>,
    pub time_limit_minutes: Option<u32>,
    pub limit: u32,
    pub seed: Option<u64>,
}

impl Args {
    /// Parse `argv` (without the program name). Environment values are read first and
    /// flags override them.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: &impl Env,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();

        let command = match args.next() {
            None => Command::Help,
            Some(first) => {
                Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?
            }
        };

        let mut parsed = Self {
            command,
            db_url: env
                .var("TUTOR_DB_URL")
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            user_id: match env.var("TUTOR_USER_ID") {
                Some(raw) => parse_user(raw)?,
                None => UserId::new(1),
            },
            count: None,
            difficulty: None,
            bank: None,
            time_limit_minutes: match env.var("TUTOR_TIME_LIMIT_MINUTES") {
                Some(raw) => Some(parse_time_limit(raw)?),
                None => None,
            },
            limit: DEFAULT_RESULTS_LIMIT,
            seed: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    parsed.user_id = parse_user(require_value(&mut args, "--user")?)?;
                }
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    let count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                    parsed.count = Some(count);
                }
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    let difficulty = Difficulty::parse(&value)
                        .ok_or(ArgsError::InvalidDifficulty { raw: value })?;
                    parsed.difficulty = Some(difficulty);
                }
                "--bank" => {
                    parsed.bank = Some(PathBuf::from(require_value(&mut args, "--bank")?));
                }
                "--time-limit" => {
                    let value = require_value(&mut args, "--time-limit")?;
                    parsed.time_limit_minutes = Some(parse_time_limit(value)?);
                }
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    parsed.limit = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidLimit { raw: value })?;
                }
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    let seed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    parsed.seed = Some(seed);
                }
                "--help" | "-h" => parsed.command = Command::Help,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse::<UserId>()
        .map_err(|_| ArgsError::InvalidUserId { raw })
}

fn parse_time_limit(raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ArgsError::InvalidTimeLimit { raw })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- quiz    [--db <sqlite_url>] [--user <id>] [--count <n>]");
    eprintln!("                              [--difficulty easy|medium|hard] [--bank <file.json>]");
    eprintln!("                              [--time-limit <minutes>] [--seed <u64>]");
    eprintln!("  cargo run -p app -- onboard [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- results [--db <sqlite_url>] [--user <id>] [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --user 1");
    eprintln!("  --limit {DEFAULT_RESULTS_LIMIT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_USER_ID, TUTOR_TIME_LIMIT_MINUTES, TUTOR_LOG");
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl Env for MapEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| (*v).to_string())
        }
    }

    fn argv(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn no_env() -> MapEnv {
        MapEnv(HashMap::new())
    }

    #[test]
    fn quiz_flags_are_parsed() {
        let args = Args::parse(
            argv(&[
                "quiz",
                "--user",
                "7",
                "--count",
                "5",
                "--difficulty",
                "medium",
                "--time-limit",
                "3",
                "--seed",
                "42",
                "--db",
                "sqlite::memory:",
            ]),
            &no_env(),
        )
        .unwrap();
        assert_eq!(args.command, Command::Quiz);
        assert_eq!(args.user_id, UserId::new(7));
        assert_eq!(args.count, Some(5));
        assert_eq!(args.difficulty, Some(Difficulty::Medium));
        assert_eq!(args.time_limit_minutes, Some(3));
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn environment_fills_defaults_and_flags_win() {
        let env = MapEnv(HashMap::from([
            ("TUTOR_DB_URL", "sqlite::memory:"),
            ("TUTOR_USER_ID", "12"),
            ("TUTOR_TIME_LIMIT_MINUTES", "15"),
        ]));
        let args = Args::parse(argv(&["results"]), &env).unwrap();
        assert_eq!(args.user_id, UserId::new(12));
        assert_eq!(args.time_limit_minutes, Some(15));
        assert_eq!(args.limit, DEFAULT_RESULTS_LIMIT);

        let args = Args::parse(argv(&["results", "--user", "3", "--limit", "2"]), &env).unwrap();
        assert_eq!(args.user_id, UserId::new(3));
        assert_eq!(args.limit, 2);
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            Args::parse(argv(&["quiz", "--count", "0"]), &no_env()),
            Err(ArgsError::InvalidCount { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["quiz", "--difficulty", "extreme"]), &no_env()),
            Err(ArgsError::InvalidDifficulty { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["quiz", "--user"]), &no_env()),
            Err(ArgsError::MissingValue { flag: "--user" })
        ));
        assert!(matches!(
            Args::parse(argv(&["dance"]), &no_env()),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["quiz", "--verbose"]), &no_env()),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn no_arguments_prints_help() {
        let args = Args::parse(Vec::new(), &no_env()).unwrap();
        assert_eq!(args.command, Command::Help);
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/tutor.sqlite3".into());
        assert!(url.starts_with("sqlite:///") || url.starts_with("sqlite://"));
        assert!(url.ends_with("data/tutor.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
    }
}
