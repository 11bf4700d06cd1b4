//! Referential integrity audit.
//!
//! Recomputes the denormalized indexes and coverage totals from foreign keys
//! and reports every disagreement. The audit only reads; it never repairs.

use crate::model::claim::{Claim, ClaimId};
use crate::model::contract::ContractId;
use crate::model::item::ItemId;
use crate::model::repair_order::RepairOrderId;
use crate::model::Cents;
use crate::repo::ledger_repo::{ClaimFilter, LedgerRepository};
use crate::repo::RepoResult;
use crate::service::lifecycle_service::committed_total;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Stored index of `owner` disagreeing with the rows that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDrift {
    pub owner: String,
    /// Referencing rows absent from the stored index.
    pub missing: Vec<Uuid>,
    /// Stored ids with no matching referencing row.
    pub unexpected: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageOverrun {
    pub contract_id: ContractId,
    pub limit: Cents,
    pub committed: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOrderMismatch {
    pub repair_order_id: RepairOrderId,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub claim_index_drift: Vec<IndexDrift>,
    pub contract_index_drift: Vec<IndexDrift>,
    pub coverage_overruns: Vec<CoverageOverrun>,
    pub repair_order_mismatches: Vec<RepairOrderMismatch>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.claim_index_drift.is_empty()
            && self.contract_index_drift.is_empty()
            && self.coverage_overruns.is_empty()
            && self.repair_order_mismatches.is_empty()
    }

    /// Number of findings across all categories.
    pub fn finding_count(&self) -> usize {
        self.claim_index_drift.len()
            + self.contract_index_drift.len()
            + self.coverage_overruns.len()
            + self.repair_order_mismatches.len()
    }
}

/// Audits every user, contract, claim and repair order visible to `repo`.
pub fn check_integrity<R: LedgerRepository>(repo: &R) -> RepoResult<IntegrityReport> {
    let users = repo.list_users()?;
    let contracts = repo.list_contracts(None)?;
    let claims = repo.list_claims(&ClaimFilter::default())?;
    let orders = repo.list_repair_orders(true)?;

    let mut claims_by_contract: HashMap<ContractId, Vec<Claim>> = HashMap::new();
    for claim in &claims {
        claims_by_contract
            .entry(claim.contract_id)
            .or_default()
            .push(claim.clone());
    }
    let mut contracts_by_user: HashMap<&str, Vec<ContractId>> = HashMap::new();
    for contract in &contracts {
        contracts_by_user
            .entry(contract.username.as_str())
            .or_default()
            .push(contract.id);
    }

    let mut report = IntegrityReport::default();

    for user in &users {
        let actual = contracts_by_user
            .get(user.username.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(drift) = diff_index(&user.username, &user.contract_index, actual) {
            report.contract_index_drift.push(drift);
        }
    }

    for contract in &contracts {
        let owned = claims_by_contract
            .get(&contract.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let owned_ids: Vec<ClaimId> = owned.iter().map(|claim| claim.id).collect();
        let owner = contract.id.to_string();
        if let Some(drift) = diff_index(&owner, &contract.claim_index, &owned_ids) {
            report.claim_index_drift.push(drift);
        }

        if let Some(contract_type) = repo.get_contract_type(contract.contract_type_id)? {
            let committed = committed_total(owned, None);
            if committed > contract_type.max_sum_insured {
                report.coverage_overruns.push(CoverageOverrun {
                    contract_id: contract.id,
                    limit: contract_type.max_sum_insured,
                    committed,
                });
            }
        }
    }

    let claims_by_id: HashMap<ClaimId, &Claim> = claims.iter().map(|c| (c.id, c)).collect();
    let items_by_contract: HashMap<ContractId, ItemId> =
        contracts.iter().map(|c| (c.id, c.item_id)).collect();
    for order in &orders {
        let reason = match claims_by_id.get(&order.claim_id) {
            None => Some("claim is missing"),
            Some(claim) if claim.contract_id != order.contract_id => {
                Some("contract differs from claim contract")
            }
            Some(_) if items_by_contract.get(&order.contract_id) != Some(&order.item_id) => {
                Some("item differs from contract item")
            }
            Some(claim) if order.ready && !claim.repaired => {
                Some("order is ready but claim is not repaired")
            }
            Some(_) => None,
        };
        if let Some(reason) = reason {
            report.repair_order_mismatches.push(RepairOrderMismatch {
                repair_order_id: order.id,
                reason,
            });
        }
    }

    Ok(report)
}

fn diff_index(owner: &str, stored: &[Uuid], actual: &[Uuid]) -> Option<IndexDrift> {
    let stored: BTreeSet<Uuid> = stored.iter().copied().collect();
    let actual: BTreeSet<Uuid> = actual.iter().copied().collect();
    if stored == actual {
        return None;
    }
    Some(IndexDrift {
        owner: owner.to_string(),
        missing: actual.difference(&stored).copied().collect(),
        unexpected: stored.difference(&actual).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::diff_index;
    use uuid::Uuid;

    #[test]
    fn diff_index_ignores_order_and_reports_both_sides() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        assert!(diff_index("u", &[a, b], &[b, a]).is_none());

        let drift = diff_index("u", &[a, c], &[a, b]).unwrap();
        assert_eq!(drift.missing, vec![b]);
        assert_eq!(drift.unexpected, vec![c]);
    }
}
