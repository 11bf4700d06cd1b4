//! Insured item model.

use super::{Cents, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned integer key.
pub type ItemId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub brand: String,
    pub model: String,
    pub price: Cents,
    pub description: String,
    /// Unique in practice; not enforced by the store.
    pub serial_no: String,
}

/// Input for registering an item before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub brand: String,
    pub model: String,
    pub price: Cents,
    #[serde(default)]
    pub description: String,
    pub serial_no: String,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.price < 0 {
            return Err(ValidationError::NegativeAmount {
                field: "item.price",
                value: self.price,
            });
        }
        if self.serial_no.trim().is_empty() {
            return Err(ValidationError::EmptyField("item.serial_no"));
        }
        Ok(())
    }
}
