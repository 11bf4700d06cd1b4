//! Repair order model.
//!
//! `contract_id` and `item_id` are always copied from the claim's contract,
//! never supplied by callers.

use super::claim::ClaimId;
use super::contract::ContractId;
use super::item::ItemId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RepairOrderId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrder {
    pub id: RepairOrderId,
    pub claim_id: ClaimId,
    pub contract_id: ContractId,
    pub item_id: ItemId,
    pub ready: bool,
}
