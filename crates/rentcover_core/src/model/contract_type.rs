//! Contract type (insurance product) model.
//!
//! # Invariants
//! - `1 <= min_duration_days <= max_duration_days`.
//! - `max_sum_insured >= 0`.
//! - `formula_per_day` is opaque pricing data and is never interpreted here.

use super::{Cents, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContractTypeId = Uuid;

/// Insurance product offered by a shop category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractType {
    pub id: ContractTypeId,
    pub shop_type: String,
    /// Pricing expression evaluated by an external pricing collaborator.
    pub formula_per_day: String,
    pub max_sum_insured: Cents,
    pub theft_insured: bool,
    pub description: String,
    pub conditions: String,
    /// Inactive types stay readable but cannot back new contracts.
    pub active: bool,
    pub min_duration_days: i64,
    pub max_duration_days: i64,
}

/// Input for creating a contract type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContractType {
    pub shop_type: String,
    pub formula_per_day: String,
    pub max_sum_insured: Cents,
    pub theft_insured: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub conditions: String,
    pub active: bool,
    pub min_duration_days: i64,
    pub max_duration_days: i64,
}

impl ContractType {
    /// Builds a validated contract type from creation input.
    pub fn from_new(id: ContractTypeId, input: NewContractType) -> Result<Self, ValidationError> {
        let contract_type = Self {
            id,
            shop_type: input.shop_type.trim().to_string(),
            formula_per_day: input.formula_per_day,
            max_sum_insured: input.max_sum_insured,
            theft_insured: input.theft_insured,
            description: input.description,
            conditions: input.conditions,
            active: input.active,
            min_duration_days: input.min_duration_days,
            max_duration_days: input.max_duration_days,
        };
        contract_type.validate()?;
        Ok(contract_type)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId("contract_type.id"));
        }
        if self.shop_type.trim().is_empty() {
            return Err(ValidationError::EmptyField("contract_type.shop_type"));
        }
        if self.max_sum_insured < 0 {
            return Err(ValidationError::NegativeAmount {
                field: "contract_type.max_sum_insured",
                value: self.max_sum_insured,
            });
        }
        if self.min_duration_days < 1 || self.min_duration_days > self.max_duration_days {
            return Err(ValidationError::DurationBounds {
                min: self.min_duration_days,
                max: self.max_duration_days,
            });
        }
        Ok(())
    }

    /// Whether a contract spanning `days` fits this product's bounds.
    pub fn allows_duration(&self, days: i64) -> bool {
        (self.min_duration_days..=self.max_duration_days).contains(&days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewContractType {
        NewContractType {
            shop_type: "  Bikes ".to_string(),
            formula_per_day: "sum_insured * 0.002".to_string(),
            max_sum_insured: 150_000,
            theft_insured: true,
            description: String::new(),
            conditions: String::new(),
            active: true,
            min_duration_days: 7,
            max_duration_days: 30,
        }
    }

    #[test]
    fn from_new_trims_shop_type() {
        let ct = ContractType::from_new(Uuid::new_v4(), input()).unwrap();
        assert_eq!(ct.shop_type, "Bikes");
    }

    #[test]
    fn rejects_inverted_duration_bounds() {
        let mut bad = input();
        bad.min_duration_days = 31;
        let err = ContractType::from_new(Uuid::new_v4(), bad).unwrap_err();
        assert_eq!(err, ValidationError::DurationBounds { min: 31, max: 30 });
    }

    #[test]
    fn rejects_negative_sum_insured() {
        let mut bad = input();
        bad.max_sum_insured = -1;
        assert!(matches!(
            ContractType::from_new(Uuid::new_v4(), bad),
            Err(ValidationError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn allows_duration_is_inclusive() {
        let ct = ContractType::from_new(Uuid::new_v4(), input()).unwrap();
        assert!(!ct.allows_duration(6));
        assert!(ct.allows_duration(7));
        assert!(ct.allows_duration(30));
        assert!(!ct.allows_duration(31));
    }
}
