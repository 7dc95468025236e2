//! Command-line front end for the journal entry store.
//!
//! # Responsibility
//! - Translate subcommands into entry store calls against one SQLite file.
//! - Print results as JSON and map store outcomes to exit codes.
//!
//! # Exit codes
//! - `0` success, `2` invalid argument, `3` not found, `4` conflict,
//!   `1` any other failure.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use journal_core::db::{open_db_with, DbConfig};
use journal_core::{
    default_log_level, init_logging, retry_on_conflict, EntryId, EntryStore, InvalidEntryId,
    SqliteEntryRepository, StoreError, StoreErrorKind,
};
use log::error;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    status: u16,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("journal: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&cli) {
        Ok(output) => {
            if let Some(output) = output {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(failure) => failure.report(),
    }
}

enum Failure {
    Store(StoreError),
    /// Id text that cannot name any entry; reported like a missing entry.
    UnknownId(InvalidEntryId),
    Setup(String),
}

impl Failure {
    fn kind(&self) -> Option<StoreErrorKind> {
        match self {
            Self::Store(err) => Some(err.kind()),
            Self::UnknownId(_) => Some(StoreErrorKind::NotFound),
            Self::Setup(_) => None,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Store(err) => err.to_string(),
            Self::UnknownId(InvalidEntryId(value)) => format!("entry not found: {value}"),
            Self::Setup(message) => message.clone(),
        }
    }

    fn report(self) -> ExitCode {
        let message = self.message();
        let Some(kind) = self.kind() else {
            error!("event=cli_setup module=cli status=error error={message}");
            eprintln!("journal: {message}");
            return ExitCode::FAILURE;
        };

        let body = ErrorBody {
            error: kind.as_str(),
            status: kind.http_status(),
            message,
        };
        match serde_json::to_string(&body) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("journal: {}", body.message),
        }
        ExitCode::from(exit_code(kind))
    }
}

impl From<StoreError> for Failure {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn exit_code(kind: StoreErrorKind) -> u8 {
    match kind {
        StoreErrorKind::InvalidArgument => 2,
        StoreErrorKind::NotFound => 3,
        StoreErrorKind::Conflict => 4,
        StoreErrorKind::Backend => 1,
    }
}

fn run(cli: &Cli) -> Result<Option<String>, Failure> {
    let config = DbConfig {
        busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
        ..DbConfig::default()
    };
    let conn = open_db_with(&cli.db, &config)
        .map_err(|err| Failure::Setup(format!("cannot open {}: {err}", cli.db.display())))?;
    let repo =
        SqliteEntryRepository::try_new(&conn).map_err(|err| Failure::Setup(err.to_string()))?;
    let store = EntryStore::new(repo);

    match &cli.command {
        Commands::List => to_json(&store.list()?).map(Some),
        Commands::Get { id } => to_json(&store.get(parse_id(id)?)?).map(Some),
        Commands::Create { content } => to_json(&store.create(content.as_str())?).map(Some),
        Commands::Update { id, content, retry } => {
            let id = parse_id(id)?;
            let updated = retry_on_conflict(*retry, || store.update(id, content.as_str()))?;
            to_json(&updated).map(Some)
        }
        Commands::Delete { id } => {
            store.delete(parse_id(id)?)?;
            Ok(None)
        }
    }
}

fn parse_id(value: &str) -> Result<EntryId, Failure> {
    EntryId::parse(value).map_err(Failure::UnknownId)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Failure> {
    serde_json::to_string_pretty(value).map_err(|err| Failure::Setup(err.to_string()))
}
