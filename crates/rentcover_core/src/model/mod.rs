//! Domain model for the rental insurance ledger.
//!
//! # Responsibility
//! - Define canonical records for contract types, items, contracts, claims,
//!   users and repair orders.
//! - Provide self-contained validation for invariants that need only one row.
//!
//! # Invariants
//! - Money is stored in integer minor units (`Cents`), never floating point.
//! - Cross-row rules (coverage totals, index consistency) live in services.

use chrono::NaiveDate;
use thiserror::Error;

pub mod claim;
pub mod contract;
pub mod contract_type;
pub mod item;
pub mod repair_order;
pub mod user;

/// Amount of money in minor currency units.
pub type Cents = i64;

/// Single-row invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be the nil uuid")]
    NilId(&'static str),
    #[error("{0} must not be blank")]
    EmptyField(&'static str),
    #[error("{field} must be >= 0, got {value}")]
    NegativeAmount { field: &'static str, value: Cents },
    #[error("duration bounds must satisfy 1 <= min ({min}) <= max ({max})")]
    DurationBounds { min: i64, max: i64 },
    #[error("end date ({end}) must be after start date ({start})")]
    DateWindow { start: NaiveDate, end: NaiveDate },
    #[error("invalid username `{0}`")]
    InvalidUsername(String),
}
