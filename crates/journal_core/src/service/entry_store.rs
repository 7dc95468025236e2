//! Entry store: CRUD over a versioned repository with optimistic concurrency.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete entry points for callers such as
//!   an HTTP layer or the CLI.
//! - Assign ids and timestamps through injected providers.
//! - Route every mutation of an existing entry through a read, version check,
//!   conditional-write cycle.
//!
//! # Invariants
//! - A stale conditional write is reported as `Conflict` and never retried
//!   here; the caller decides whether to retry.
//! - A failed operation leaves storage unchanged.
//! - Entry content is never written to logs.

use crate::model::entry::{validate_content, Entry, EntryId};
use crate::provider::{Clock, IdProvider, SystemClock, UuidIdProvider};
use crate::repo::{
    CommitOutcome, ConditionalWrite, EntryRepository, InsertOutcome, RepoError, VersionToken,
    VersionedEntry,
};
use crate::service::error::StoreError;
use log::{debug, info, warn};

/// Number of fresh ids `create` draws before giving up on collisions.
const MAX_ID_ATTEMPTS: u32 = 4;

pub type StoreResult<T> = Result<T, StoreError>;

/// Journal entry store over a versioned repository.
pub struct EntryStore<R, I = UuidIdProvider, C = SystemClock> {
    repo: R,
    ids: I,
    clock: C,
}

impl<R: EntryRepository> EntryStore<R> {
    /// Creates a store with random v4 ids and the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_providers(repo, UuidIdProvider, SystemClock)
    }
}

impl<R, I, C> EntryStore<R, I, C>
where
    R: EntryRepository,
    I: IdProvider,
    C: Clock,
{
    /// Creates a store with caller-supplied id and clock providers.
    pub fn with_providers(repo: R, ids: I, clock: C) -> Self {
        Self { repo, ids, clock }
    }

    /// Underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists all live entries as one snapshot, oldest first.
    pub fn list(&self) -> StoreResult<Vec<Entry>> {
        let entries = self.repo.read_all()?;
        debug!(
            "event=entry_list module=store status=ok count={}",
            entries.len()
        );
        Ok(entries.into_iter().map(|item| item.entry).collect())
    }

    /// Gets one entry by id.
    pub fn get(&self, id: EntryId) -> StoreResult<Entry> {
        self.get_versioned(id).map(|item| item.entry)
    }

    /// Gets one entry together with the version it was read at.
    pub fn get_versioned(&self, id: EntryId) -> StoreResult<VersionedEntry> {
        self.repo.read(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Creates an entry with a fresh id and the current time.
    pub fn create(&self, content: impl Into<String>) -> StoreResult<Entry> {
        let content = content.into();
        validate_content(&content)?;

        let created_at = self.clock.now_ms();
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let entry = Entry::new(self.ids.next_id(), content.as_str(), created_at)?;
            match self.repo.insert_new(&entry)? {
                InsertOutcome::Inserted(_) => {
                    info!(
                        "event=entry_create module=store status=ok entry_id={} content_len={}",
                        entry.id,
                        entry.content.len()
                    );
                    return Ok(entry);
                }
                InsertOutcome::IdTaken => {
                    warn!(
                        "event=entry_create module=store status=id_taken entry_id={} attempt={}",
                        entry.id, attempt
                    );
                }
            }
        }

        Err(StoreError::Backend(RepoError::InvalidData(format!(
            "id provider returned {MAX_ID_ATTEMPTS} ids already in use"
        ))))
    }

    /// Replaces an entry's content.
    ///
    /// Reads the current version and commits against it; `Conflict` means
    /// another writer committed in between.
    pub fn update(&self, id: EntryId, content: impl Into<String>) -> StoreResult<Entry> {
        let current = self.get_versioned(id)?;
        let content = content.into();
        validate_content(&content)?;
        self.commit_revision(current, content).map(|item| item.entry)
    }

    /// Replaces an entry's content only if it is still at `expected`.
    pub fn update_if(
        &self,
        id: EntryId,
        expected: VersionToken,
        content: impl Into<String>,
    ) -> StoreResult<VersionedEntry> {
        let current = self.get_versioned(id)?;
        let content = content.into();
        validate_content(&content)?;
        if current.version != expected {
            return Err(self.conflict(id, "entry_update"));
        }
        self.commit_revision(current, content)
    }

    /// Deletes an entry.
    pub fn delete(&self, id: EntryId) -> StoreResult<()> {
        let current = self.get_versioned(id)?;
        self.commit_removal(id, current.version)
    }

    /// Deletes an entry only if it is still at `expected`.
    pub fn delete_if(&self, id: EntryId, expected: VersionToken) -> StoreResult<()> {
        let current = self.get_versioned(id)?;
        if current.version != expected {
            return Err(self.conflict(id, "entry_delete"));
        }
        self.commit_removal(id, expected)
    }

    fn commit_revision(
        &self,
        current: VersionedEntry,
        content: String,
    ) -> StoreResult<VersionedEntry> {
        let id = current.entry.id;
        let revised = current.entry.revised(content, self.clock.now_ms())?;

        match self.repo.commit(
            id,
            current.version,
            ConditionalWrite::Replace(revised.clone()),
        )? {
            CommitOutcome::Committed(Some(version)) => {
                info!(
                    "event=entry_update module=store status=ok entry_id={} content_len={}",
                    id,
                    revised.content.len()
                );
                Ok(VersionedEntry {
                    entry: revised,
                    version,
                })
            }
            CommitOutcome::Committed(None) => Err(StoreError::Backend(RepoError::InvalidData(
                format!("replace of {id} committed without a new version"),
            ))),
            CommitOutcome::Stale => Err(self.conflict(id, "entry_update")),
        }
    }

    fn commit_removal(&self, id: EntryId, expected: VersionToken) -> StoreResult<()> {
        match self.repo.commit(id, expected, ConditionalWrite::Remove)? {
            CommitOutcome::Committed(_) => {
                info!("event=entry_delete module=store status=ok entry_id={id}");
                Ok(())
            }
            CommitOutcome::Stale => Err(self.conflict(id, "entry_delete")),
        }
    }

    fn conflict(&self, id: EntryId, event: &str) -> StoreError {
        warn!("event={event} module=store status=conflict entry_id={id}");
        StoreError::Conflict(id)
    }
}

/// Runs `op` until it returns something other than `Conflict`, trying at
/// most `attempts` times in total.
///
/// This is a caller-side policy; the store never retries on its own.
pub fn retry_on_conflict<T, F>(attempts: u32, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> StoreResult<T>,
{
    let attempts = attempts.max(1);
    let mut tried = 1;
    loop {
        match op() {
            Err(err) if err.is_conflict() && tried < attempts => {
                debug!("event=entry_retry module=store status=retry attempt={tried}");
                tried += 1;
            }
            other => return other,
        }
    }
}
