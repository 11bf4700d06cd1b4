//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `rentcover_core` linkage and open a ledger database.
//! - Print schema version and an integrity summary in `key=value` form.
//!
//! Usage: `rentcover_cli [DB_PATH]`; without a path an in-memory ledger is used.

use rentcover_core::db::migrations::schema_version;
use rentcover_core::{open_db, open_db_in_memory, LedgerQueries};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("rentcover_core version={}", rentcover_core::core_version());

    let path = std::env::args().nth(1);
    let conn = match path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    let conn = match conn {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("status=error stage=open error={err}");
            return ExitCode::FAILURE;
        }
    };

    match schema_version(&conn) {
        Ok(version) => println!("schema_version={version}"),
        Err(err) => {
            eprintln!("status=error stage=schema error={err}");
            return ExitCode::FAILURE;
        }
    }

    let report = LedgerQueries::try_new(&conn).and_then(|queries| queries.check_integrity());
    match report {
        Ok(report) => {
            println!(
                "integrity clean={} claim_index_drift={} contract_index_drift={} coverage_overruns={} repair_order_mismatches={}",
                report.is_clean(),
                report.claim_index_drift.len(),
                report.contract_index_drift.len(),
                report.coverage_overruns.len(),
                report.repair_order_mismatches.len()
            );
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            eprintln!("status=error stage=integrity error={err}");
            ExitCode::FAILURE
        }
    }
}
