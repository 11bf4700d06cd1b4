//! Embedded ledger schema migrations and schema readiness checks.
//!
//! # Responsibility
//! - Register ledger migrations in strictly increasing order.
//! - Apply every pending migration inside one transaction.
//! - Let repositories verify a connection before issuing ledger queries.
//!
//! # Invariants
//! - `version` values are monotonic and mirrored to `PRAGMA user_version`.
//! - A partially applied migration set is never committed.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "ledger_tables",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "lookup_indexes",
        sql: include_str!("0002_lookup_indexes.sql"),
    },
    Migration {
        version: 3,
        name: "claim_police_outcome",
        sql: include_str!("0003_claim_police_outcome.sql"),
    },
];

/// Tables and columns the ledger repository reads and writes.
pub const LEDGER_SCHEMA: &[(&str, &[&str])] = &[
    (
        "contract_types",
        &[
            "id",
            "shop_type",
            "formula_per_day",
            "max_sum_insured",
            "theft_insured",
            "active",
            "min_duration_days",
            "max_duration_days",
        ],
    ),
    ("items", &["id", "brand", "model", "price", "serial_no"]),
    (
        "users",
        &["username", "password", "contract_index", "version"],
    ),
    (
        "contracts",
        &[
            "id",
            "username",
            "item_id",
            "contract_type_id",
            "start_date",
            "end_date",
            "void",
            "claim_index",
            "version",
        ],
    ),
    (
        "claims",
        &[
            "id",
            "contract_id",
            "date",
            "is_theft",
            "status",
            "reimbursable",
            "repaired",
            "file_reference",
            "police_confirmed",
        ],
    ),
    (
        "repair_orders",
        &["id", "claim_id", "contract_id", "item_id", "ready"],
    ),
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads `PRAGMA user_version` from the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

/// Verifies the connection is migrated and exposes every ledger column.
pub fn ensure_ledger_schema(conn: &Connection) -> DbResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in LEDGER_SCHEMA {
        let present = table_columns(conn, table)?;
        if present.is_empty() {
            return Err(DbError::MissingRequiredTable(table));
        }
        if let Some(&column) = columns
            .iter()
            .find(|column| !present.iter().any(|p| p.as_str() == **column))
        {
            return Err(DbError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
