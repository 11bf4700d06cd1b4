use rentcover_core::db::migrations::{ensure_ledger_schema, latest_version, schema_version};
use rentcover_core::db::{open_db, open_db_in_memory, DbError};
use rentcover_core::SqliteLedgerRepository;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in [
        "contract_types",
        "items",
        "users",
        "contracts",
        "claims",
        "repair_orders",
    ] {
        assert_table_exists(&conn, table);
    }
    ensure_ledger_schema(&conn).unwrap();
}

#[test]
fn reopening_file_database_keeps_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first).unwrap(), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    assert_table_exists(&second, "claims");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn repository_refuses_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteLedgerRepository::try_new(&conn).unwrap_err();
    assert!(
        err.to_string().contains("schema version"),
        "unexpected error: {err}"
    );
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO repair_orders (id, claim_id, contract_id, item_id, ready)
             VALUES ('a', 'missing-claim', 'missing-contract', 1, 0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn unknown_claim_status_code_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    let err = conn
        .execute(
            "INSERT INTO claims (id, contract_id, date, description, is_theft, status, reimbursable, repaired)
             VALUES ('c', 'k', '2024-01-02', '', 0, 'pending', 0, 0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
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
