//! Core domain logic for the journal entry store.
//! This crate is the single source of truth for entry invariants and the
//! optimistic-concurrency write protocol.

pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{validate_content, Entry, EntryId, EntryValidationError, InvalidEntryId};
pub use provider::{Clock, IdProvider, SystemClock, UuidIdProvider};
pub use repo::memory_repo::MemoryEntryRepository;
pub use repo::sqlite_repo::SqliteEntryRepository;
pub use repo::{
    CommitOutcome, ConditionalWrite, EntryRepository, InsertOutcome, RepoError, RepoResult,
    VersionToken, VersionedEntry,
};
pub use service::entry_store::{retry_on_conflict, EntryStore, StoreResult};
pub use service::error::{StoreError, StoreErrorKind};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
