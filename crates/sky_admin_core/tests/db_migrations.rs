use rusqlite::{Connection, ErrorCode};
use sky_admin_core::db::migrations::latest_version;
use sky_admin_core::db::{open_db, open_db_in_memory, DbError};

fn insert_raw(conn: &Connection, username: &str, status: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO accounts (name, username, password_hash, status)
         VALUES ('Seed', ?1, 'x', ?2);",
        rusqlite::params![username, status],
    )
}

#[test]
fn fresh_database_is_at_latest_schema_with_nullable_audit_columns() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    insert_raw(&conn, "seed", 1).unwrap();
    let audit: (Option<i64>, Option<i64>, Option<i64>, Option<i64>) = conn
        .query_row(
            "SELECT create_time, update_time, create_user, update_user
             FROM accounts WHERE username = 'seed';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(audit, (None, None, None, None));
}

#[test]
fn reopening_keeps_rows_and_account_constraints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sky_admin.db");

    let first = open_db(&path).unwrap();
    insert_raw(&first, "admin", 1).unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());

    let kept: i64 = second
        .query_row("SELECT COUNT(*) FROM accounts WHERE username = 'admin';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(kept, 1);

    let duplicate = insert_raw(&second, "admin", 1).unwrap_err();
    assert_eq!(duplicate.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));

    let bad_status = insert_raw(&second, "other", 7).unwrap_err();
    assert_eq!(bad_status.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));
}

#[test]
fn newer_schema_is_refused_without_touching_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'accounts';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
