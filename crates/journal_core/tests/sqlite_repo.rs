use journal_core::db::migrations::latest_version;
use journal_core::db::{open_db, open_db_in_memory};
use journal_core::{
    CommitOutcome, ConditionalWrite, Entry, EntryId, EntryRepository, EntryStore, InsertOutcome,
    RepoError, SqliteEntryRepository, StoreError,
};
use rusqlite::Connection;

fn entry(content: &str, created_at: i64) -> Entry {
    Entry::new(EntryId::new_v4(), content, created_at).unwrap()
}

#[test]
fn insert_read_and_conditional_replace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    let stored = entry("hello", 100);
    let InsertOutcome::Inserted(version) = repo.insert_new(&stored).unwrap() else {
        panic!("fresh id should insert");
    };

    let read = repo.read(stored.id).unwrap().unwrap();
    assert_eq!(read.entry, stored);
    assert_eq!(read.version, version);

    let revised = stored.revised("hello world", 200).unwrap();
    let outcome = repo
        .commit(stored.id, version, ConditionalWrite::Replace(revised.clone()))
        .unwrap();
    let CommitOutcome::Committed(Some(next)) = outcome else {
        panic!("current version should commit, got {outcome:?}");
    };
    assert_ne!(next, version);

    let read = repo.read(stored.id).unwrap().unwrap();
    assert_eq!(read.entry, revised);
    assert_eq!(read.version, next);
}

#[test]
fn stale_version_commits_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    let stored = entry("hello", 100);
    let InsertOutcome::Inserted(version) = repo.insert_new(&stored).unwrap() else {
        panic!("fresh id should insert");
    };
    let first = stored.revised("first", 200).unwrap();
    repo.commit(stored.id, version, ConditionalWrite::Replace(first.clone()))
        .unwrap();

    let second = stored.revised("second", 300).unwrap();
    assert_eq!(
        repo.commit(stored.id, version, ConditionalWrite::Replace(second))
            .unwrap(),
        CommitOutcome::Stale
    );
    assert_eq!(
        repo.commit(stored.id, version, ConditionalWrite::Remove)
            .unwrap(),
        CommitOutcome::Stale
    );
    assert_eq!(repo.read(stored.id).unwrap().unwrap().entry, first);
}

#[test]
fn removed_row_is_hidden_and_its_id_stays_reserved() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    let stored = entry("hello", 100);
    let InsertOutcome::Inserted(version) = repo.insert_new(&stored).unwrap() else {
        panic!("fresh id should insert");
    };
    assert_eq!(
        repo.commit(stored.id, version, ConditionalWrite::Remove)
            .unwrap(),
        CommitOutcome::Committed(None)
    );

    assert!(repo.read(stored.id).unwrap().is_none());
    assert!(repo.read_all().unwrap().is_empty());
    assert_eq!(repo.insert_new(&stored).unwrap(), InsertOutcome::IdTaken);

    let tombstones: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM entries WHERE is_deleted = 1;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tombstones, 1);
}

#[test]
fn invalid_entries_are_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    let blank = Entry {
        id: EntryId::new_v4(),
        content: " ".to_string(),
        created_at: 1,
        modified_at: None,
    };
    assert!(matches!(
        repo.insert_new(&blank),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn corrupted_rows_are_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO entries (id, content, created_at) VALUES ('not-a-uuid', 'x', 1);",
        [],
    )
    .unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    assert!(matches!(repo.read_all(), Err(RepoError::InvalidData(_))));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteEntryRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_entries_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteEntryRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("entries"))
    ));
}

#[test]
fn repository_rejects_connection_missing_version_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE entries (
            id TEXT PRIMARY KEY NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            modified_at INTEGER
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteEntryRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "entries",
            column: "version"
        })
    ));
}

#[test]
fn writes_through_one_connection_conflict_with_reads_from_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();
    let store_a = EntryStore::new(SqliteEntryRepository::try_new(&conn_a).unwrap());
    let store_b = EntryStore::new(SqliteEntryRepository::try_new(&conn_b).unwrap());

    let created = store_a.create("shared").unwrap();
    let seen_by_a = store_a.get_versioned(created.id).unwrap();
    let seen_by_b = store_b.get_versioned(created.id).unwrap();
    assert_eq!(seen_by_a, seen_by_b);

    store_b
        .update_if(created.id, seen_by_b.version, "from b")
        .unwrap();

    let err = store_a
        .update_if(created.id, seen_by_a.version, "from a")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(id) if id == created.id));
    assert_eq!(store_a.get(created.id).unwrap().content, "from b");

    let err = store_a.delete_if(created.id, seen_by_a.version).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store_b.list().unwrap().len(), 1);
}

#[test]
fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let created = {
        let conn = open_db(&path).unwrap();
        let store = EntryStore::new(SqliteEntryRepository::try_new(&conn).unwrap());
        let created = store.create("persisted").unwrap();
        let updated = store.update(created.id, "persisted twice").unwrap();
        updated
    };

    let conn = open_db(&path).unwrap();
    let store = EntryStore::new(SqliteEntryRepository::try_new(&conn).unwrap());
    assert_eq!(store.get(created.id).unwrap(), created);
}
