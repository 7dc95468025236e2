//! In-process entry repository.
//!
//! # Responsibility
//! - Provide the versioned key-value contract without external storage.
//! - Give each store instance its own isolated map.
//!
//! # Invariants
//! - Keys are spread over fixed shards; a write locks only its own shard.
//! - `read_all` holds every shard's read lock at once, acquired in shard
//!   order, so the snapshot never mixes states from before and after a commit.
//! - Removed keys keep a tombstone slot; their ids are never reissued.
//! - Slot versions only grow, including across removal.

use super::{
    ensure_replacement_matches, CommitOutcome, ConditionalWrite, EntryRepository, InsertOutcome,
    RepoError, RepoResult, VersionToken, VersionedEntry,
};
use crate::model::entry::{Entry, EntryId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const SHARD_COUNT: usize = 16;

#[derive(Debug)]
struct Slot {
    version: VersionToken,
    /// `None` once removed.
    entry: Option<Entry>,
}

type Shard = HashMap<EntryId, Slot>;

/// Sharded in-memory entry map.
#[derive(Debug)]
pub struct MemoryEntryRepository {
    shards: Vec<RwLock<Shard>>,
}

impl Default for MemoryEntryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> RepoResult<usize> {
        let mut total = 0;
        for shard in &self.shards {
            let guard = shard.read().map_err(|_| RepoError::LockPoisoned)?;
            total += guard.values().filter(|slot| slot.entry.is_some()).count();
        }
        Ok(total)
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }

    fn shard_index(id: EntryId) -> usize {
        (id.as_uuid().as_u128() % SHARD_COUNT as u128) as usize
    }

    fn read_shard(&self, id: EntryId) -> RepoResult<RwLockReadGuard<'_, Shard>> {
        self.shards[Self::shard_index(id)]
            .read()
            .map_err(|_| RepoError::LockPoisoned)
    }

    fn write_shard(&self, id: EntryId) -> RepoResult<RwLockWriteGuard<'_, Shard>> {
        self.shards[Self::shard_index(id)]
            .write()
            .map_err(|_| RepoError::LockPoisoned)
    }
}

impl EntryRepository for MemoryEntryRepository {
    fn read(&self, id: EntryId) -> RepoResult<Option<VersionedEntry>> {
        let shard = self.read_shard(id)?;
        Ok(shard.get(&id).and_then(|slot| {
            slot.entry.as_ref().map(|entry| VersionedEntry {
                entry: entry.clone(),
                version: slot.version,
            })
        }))
    }

    fn read_all(&self) -> RepoResult<Vec<VersionedEntry>> {
        let guards = self
            .shards
            .iter()
            .map(|shard| shard.read().map_err(|_| RepoError::LockPoisoned))
            .collect::<RepoResult<Vec<_>>>()?;

        let mut entries: Vec<VersionedEntry> = guards
            .iter()
            .flat_map(|guard| guard.values())
            .filter_map(|slot| {
                slot.entry.as_ref().map(|entry| VersionedEntry {
                    entry: entry.clone(),
                    version: slot.version,
                })
            })
            .collect();
        drop(guards);

        entries.sort_by(|a, b| {
            a.entry
                .created_at
                .cmp(&b.entry.created_at)
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });
        Ok(entries)
    }

    fn insert_new(&self, entry: &Entry) -> RepoResult<InsertOutcome> {
        entry.validate()?;

        let mut shard = self.write_shard(entry.id)?;
        if shard.contains_key(&entry.id) {
            return Ok(InsertOutcome::IdTaken);
        }

        let version = VersionToken::new(1);
        shard.insert(
            entry.id,
            Slot {
                version,
                entry: Some(entry.clone()),
            },
        );
        Ok(InsertOutcome::Inserted(version))
    }

    fn commit(
        &self,
        id: EntryId,
        expected: VersionToken,
        write: ConditionalWrite,
    ) -> RepoResult<CommitOutcome> {
        ensure_replacement_matches(id, &write)?;

        let mut shard = self.write_shard(id)?;
        let Some(slot) = shard.get_mut(&id) else {
            return Ok(CommitOutcome::Stale);
        };
        if slot.entry.is_none() || slot.version != expected {
            return Ok(CommitOutcome::Stale);
        }

        slot.version = slot.version.next();
        match write {
            ConditionalWrite::Replace(entry) => {
                slot.entry = Some(entry);
                Ok(CommitOutcome::Committed(Some(slot.version)))
            }
            ConditionalWrite::Remove => {
                slot.entry = None;
                Ok(CommitOutcome::Committed(None))
            }
        }
    }
}
