//! Unit tests for the Smartmark database layer (connection + migrations).

use smartmark::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use smartmark::database::Database;
use tempfile::TempDir;

fn object_exists(db: &Database, kind: &str, name: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type=?1 AND name=?2",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap_or(false)
}

#[test]
fn test_open_in_memory_succeeds() {
    assert!(Database::open_in_memory().is_ok());
}

#[test]
fn test_migrations_create_all_tables() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    for table in ["identities", "auth_session", "bookmarks", "schema_version"] {
        assert!(object_exists(&db, "table", table), "table '{}' missing", table);
    }
}

#[test]
fn test_migrations_create_owner_index() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert!(object_exists(&db, "index", "idx_bookmarks_owner_created"));
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert!(run_all(db.connection()).is_ok());
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_auth_session_holds_a_single_slot() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();
    conn.execute(
        "INSERT INTO identities (id, provider, created_at) VALUES ('u1', 'google', 0)",
        [],
    )
    .unwrap();
    let rejected = conn.execute(
        "INSERT INTO auth_session (slot, identity_id, signed_in_at) VALUES ('other', 'u1', 0)",
        [],
    );
    assert!(rejected.is_err());
}

#[test]
fn test_open_file_database_persists() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("smartmark.db");
    {
        let db = Database::open(&path).expect("open failed");
        db.connection()
            .execute(
                "INSERT INTO identities (id, provider, created_at) VALUES ('u1', 'github', 0)",
                [],
            )
            .unwrap();
    }
    let db = Database::open(&path).expect("reopen failed");
    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
