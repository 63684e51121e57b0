use gradebook_core::db::migrations::latest_version;
use gradebook_core::db::{open_db, open_db_in_memory, DbError};
use gradebook_core::repo::ensure_connection_ready;
use gradebook_core::RepoError;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "departments",
        "users",
        "students",
        "teachers",
        "courses",
        "grade_bands",
        "enrollments",
        "academic_records",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn migrations_seed_default_grade_scale() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT letter, point, min_score, max_score FROM grade_bands ORDER BY min_score DESC;")
        .unwrap();
    let bands = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(
        bands,
        vec![
            ("A".to_string(), 4, 70, 100),
            ("B".to_string(), 3, 60, 69),
            ("C".to_string(), 2, 50, 59),
            ("D".to_string(), 1, 45, 49),
            ("E".to_string(), 0, 40, 44),
            ("F".to_string(), 0, 0, 39),
        ]
    );
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradebook.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let band_count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM grade_bands;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(band_count, 6);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn raw_connection_is_rejected_by_services() {
    let conn = Connection::open_in_memory().unwrap();

    let err = ensure_connection_ready(&conn).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO enrollments (student_id, course_id, credit) VALUES (1, 1, 3);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
