//! Versioned key-value repositories for journal entries.
//!
//! # Responsibility
//! - Define the narrow read / insert / conditional-write contract every
//!   backend satisfies.
//! - Isolate storage details (in-memory map, SQLite) from the entry store.
//!
//! # Invariants
//! - Existing keys are only ever changed through [`EntryRepository::commit`],
//!   which applies a write only if the caller's [`VersionToken`] is current.
//! - Deleted ids stay reserved; `insert_new` reports them as taken.
//! - Write paths call `Entry::validate()` before mutating storage and read
//!   paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::entry::{Entry, EntryId, EntryValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_repo;
pub mod sqlite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Opaque marker for the committed state of one key.
///
/// Tokens are only meaningful for the key and repository that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionToken(u64);

impl VersionToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub(crate) fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An entry together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEntry {
    pub entry: Entry,
    pub version: VersionToken,
}

/// Write submitted to [`EntryRepository::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalWrite {
    /// Replace the stored entry. The entry id must match the key.
    Replace(Entry),
    /// Remove the entry, leaving its id reserved.
    Remove,
}

/// Result of [`EntryRepository::insert_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(VersionToken),
    /// The id is live or was used by a deleted entry.
    IdTaken,
}

/// Result of [`EntryRepository::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The write applied. Carries the new token, or `None` after a removal.
    Committed(Option<VersionToken>),
    /// The key changed (or vanished) since `expected` was read; nothing applied.
    Stale,
}

/// Generic repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    InvalidData(String),
    LockPoisoned,
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::LockPoisoned => write!(f, "entry map lock poisoned by a panicked writer"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match required {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Versioned key-value contract shared by all entry backends.
///
/// Methods take `&self`; implementations synchronize internally or rely on
/// the backing medium's own atomicity. There is no `Sync` bound: a SQLite
/// repository borrows one connection and stays on that connection's thread,
/// while other threads open their own connection to the same file.
pub trait EntryRepository {
    /// Reads the committed value and version of one live entry.
    fn read(&self, id: EntryId) -> RepoResult<Option<VersionedEntry>>;

    /// Reads one consistent snapshot of all live entries, ordered by
    /// `created_at ASC, id ASC`.
    fn read_all(&self) -> RepoResult<Vec<VersionedEntry>>;

    /// Stores an entry under a key that has never been used.
    fn insert_new(&self, entry: &Entry) -> RepoResult<InsertOutcome>;

    /// Applies `write` to `id` only if its version still equals `expected`.
    fn commit(
        &self,
        id: EntryId,
        expected: VersionToken,
        write: ConditionalWrite,
    ) -> RepoResult<CommitOutcome>;
}

impl<R: EntryRepository + ?Sized> EntryRepository for &R {
    fn read(&self, id: EntryId) -> RepoResult<Option<VersionedEntry>> {
        (**self).read(id)
    }

    fn read_all(&self) -> RepoResult<Vec<VersionedEntry>> {
        (**self).read_all()
    }

    fn insert_new(&self, entry: &Entry) -> RepoResult<InsertOutcome> {
        (**self).insert_new(entry)
    }

    fn commit(
        &self,
        id: EntryId,
        expected: VersionToken,
        write: ConditionalWrite,
    ) -> RepoResult<CommitOutcome> {
        (**self).commit(id, expected, write)
    }
}

pub(crate) fn ensure_replacement_matches(id: EntryId, write: &ConditionalWrite) -> RepoResult<()> {
    if let ConditionalWrite::Replace(entry) = write {
        if entry.id != id {
            return Err(RepoError::InvalidData(format!(
                "replacement entry id {} does not match key {id}",
                entry.id
            )));
        }
        entry.validate()?;
    }
    Ok(())
}
