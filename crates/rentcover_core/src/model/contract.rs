//! Contract model.
//!
//! # Responsibility
//! - Bind one user to insured use of one item for a bounded date window.
//! - Carry the denormalized claim index and the optimistic-lock version.
//!
//! # Invariants
//! - `start_date < end_date`.
//! - The coverage window `[start_date, end_date]` is inclusive on both ends.
//! - `void` is one-way: voided contracts never become active again.

use super::claim::ClaimId;
use super::contract_type::ContractTypeId;
use super::item::ItemId;
use super::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContractId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub username: String,
    pub item_id: ItemId,
    pub contract_type_id: ContractTypeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub void: bool,
    /// Claim ids in filing order. Derived from `claims.contract_id`.
    pub claim_index: Vec<ClaimId>,
    /// Optimistic concurrency token, bumped on every aggregate write.
    pub version: i64,
}

impl Contract {
    /// Creates a fresh, non-void contract with an empty claim index.
    pub fn new(
        id: ContractId,
        username: impl Into<String>,
        item_id: ItemId,
        contract_type_id: ContractTypeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let contract = Self {
            id,
            username: username.into(),
            item_id,
            contract_type_id,
            start_date,
            end_date,
            void: false,
            claim_index: Vec::new(),
            version: 0,
        };
        contract.validate()?;
        Ok(contract)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId("contract.id"));
        }
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyField("contract.username"));
        }
        if self.start_date >= self.end_date {
            return Err(ValidationError::DateWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Whether `date` falls inside the coverage window.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether this contract's window intersects `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    pub fn is_active(&self) -> bool {
        !self.void
    }
}
