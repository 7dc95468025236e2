//! SQLite entry repository.
//!
//! # Responsibility
//! - Provide the versioned key-value contract over the `entries` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Each mutation is one SQL statement, so it applies fully or not at all.
//! - Conditional writes match on `version` and `is_deleted = 0`, which makes
//!   them safe across connections and processes sharing one database file.
//! - Deletion sets the `is_deleted` tombstone; rows are never reused.

use super::{
    ensure_replacement_matches, CommitOutcome, ConditionalWrite, EntryRepository, InsertOutcome,
    RepoError, RepoResult, VersionToken, VersionedEntry,
};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::entry::{Entry, EntryId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    content,
    created_at,
    modified_at,
    version
FROM entries";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "content",
    "created_at",
    "modified_at",
    "version",
    "is_deleted",
];

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Use `db::open_db` / `db::open_db_in_memory` to obtain one.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn read(&self, id: EntryId) -> RepoResult<Option<VersionedEntry>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE id = ?1
               AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn read_all(&self) -> RepoResult<Vec<VersionedEntry>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE is_deleted = 0
             ORDER BY created_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn insert_new(&self, entry: &Entry) -> RepoResult<InsertOutcome> {
        entry.validate()?;

        let version = VersionToken::new(1);
        let changed = self.conn.execute(
            "INSERT INTO entries (
                id,
                content,
                created_at,
                modified_at,
                version,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0)
            ON CONFLICT(id) DO NOTHING;",
            params![
                entry.id.to_string(),
                entry.content.as_str(),
                entry.created_at,
                entry.modified_at,
                version_to_db(version)?,
            ],
        )?;

        if changed == 0 {
            return Ok(InsertOutcome::IdTaken);
        }

        Ok(InsertOutcome::Inserted(version))
    }

    fn commit(
        &self,
        id: EntryId,
        expected: VersionToken,
        write: ConditionalWrite,
    ) -> RepoResult<CommitOutcome> {
        ensure_replacement_matches(id, &write)?;

        let changed = match &write {
            ConditionalWrite::Replace(entry) => self.conn.execute(
                "UPDATE entries
                 SET
                    content = ?3,
                    modified_at = ?4,
                    version = version + 1
                 WHERE id = ?1
                   AND version = ?2
                   AND is_deleted = 0;",
                params![
                    id.to_string(),
                    version_to_db(expected)?,
                    entry.content.as_str(),
                    entry.modified_at,
                ],
            )?,
            ConditionalWrite::Remove => self.conn.execute(
                "UPDATE entries
                 SET
                    is_deleted = 1,
                    version = version + 1
                 WHERE id = ?1
                   AND version = ?2
                   AND is_deleted = 0;",
                params![id.to_string(), version_to_db(expected)?],
            )?,
        };

        if changed == 0 {
            return Ok(CommitOutcome::Stale);
        }

        match write {
            ConditionalWrite::Replace(_) => Ok(CommitOutcome::Committed(Some(expected.next()))),
            ConditionalWrite::Remove => Ok(CommitOutcome::Committed(None)),
        }
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<VersionedEntry> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map(EntryId::from)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in entries.id")))?;

    let raw_version: i64 = row.get("version")?;
    let version = u64::try_from(raw_version)
        .ok()
        .filter(|value| *value > 0)
        .map(VersionToken::new)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid version value `{raw_version}` in entries.version"
            ))
        })?;

    let entry = Entry {
        id,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    entry.validate()?;
    Ok(VersionedEntry { entry, version })
}

fn version_to_db(version: VersionToken) -> RepoResult<i64> {
    i64::try_from(version.value())
        .map_err(|_| RepoError::InvalidData(format!("version {version} exceeds storage range")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "entries")? {
        return Err(RepoError::MissingRequiredTable("entries"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "entries", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "entries",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
