//! Contract and claim lifecycle use-case service.
//!
//! # Responsibility
//! - Create and void contracts, file claims, and drive claim status changes.
//! - Open and close repair orders and record police reports for thefts.
//! - Keep `users.contract_index` and `contracts.claim_index` in step with the
//!   rows they index, inside the same transaction as the owning write.
//!
//! # Invariants
//! - Approved/Paid reimbursements of one contract never exceed the contract
//!   type's `max_sum_insured`.
//! - An item has at most one non-void contract per overlapping date range.
//! - Claim status only moves along `ClaimStatus::can_transition_to`.
//! - Every mutation under a contract bumps that contract's `version`.

use crate::config::LedgerConfig;
use crate::db::migrations::ensure_ledger_schema;
use crate::ids::{IdGenerator, RandomIds};
use crate::model::claim::{Claim, ClaimId, ClaimStatus};
use crate::model::contract::{Contract, ContractId};
use crate::model::contract_type::ContractTypeId;
use crate::model::item::ItemId;
use crate::model::repair_order::{RepairOrder, RepairOrderId};
use crate::model::user::normalize_username;
use crate::model::{Cents, ValidationError};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoError;
use crate::service::transaction::{with_transaction, ContentionError};
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::Connection;
use std::fmt::Display;
use thiserror::Error;

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("contract type is inactive: {0}")]
    ContractTypeInactive(ContractTypeId),
    #[error("contract duration of {days} days is outside [{min}, {max}]")]
    InvalidDuration { days: i64, min: i64, max: i64 },
    #[error("item {item_id} is already covered by contract {contract_id}")]
    ItemConflict {
        item_id: ItemId,
        contract_id: ContractId,
    },
    #[error("contract is void: {0}")]
    ContractVoided(ContractId),
    #[error("claim date {date} is outside coverage window {start}..={end}")]
    OutOfCoverageWindow {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("contract {0} does not insure theft")]
    TheftNotCovered(ContractId),
    #[error("theft claim {0} has no police confirmation")]
    TheftNotConfirmed(ClaimId),
    #[error(
        "coverage exceeded on contract {contract_id}: limit {limit}, committed {committed}, requested {requested}"
    )]
    CoverageExceeded {
        contract_id: ContractId,
        limit: Cents,
        committed: Cents,
        requested: Cents,
    },
    #[error("claim {claim_id} cannot move from {from} to {to}")]
    InvalidTransition {
        claim_id: ClaimId,
        from: ClaimStatus,
        to: ClaimStatus,
    },
    #[error("repair not allowed for claim {claim_id}: {reason}")]
    RepairNotAllowed {
        claim_id: ClaimId,
        reason: &'static str,
    },
    #[error("claim {0} already has a repair order")]
    RepairOrderExists(ClaimId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{operation} gave up after {attempts} contended attempts")]
    Busy {
        operation: &'static str,
        attempts: u32,
    },
    #[error(transparent)]
    Repo(RepoError),
}

impl LifecycleError {
    /// Stable machine-readable code used in log records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ContractTypeInactive(_) => "contract_type_inactive",
            Self::InvalidDuration { .. } => "invalid_duration",
            Self::ItemConflict { .. } => "item_conflict",
            Self::ContractVoided(_) => "contract_voided",
            Self::OutOfCoverageWindow { .. } => "out_of_coverage_window",
            Self::TheftNotCovered(_) => "theft_not_covered",
            Self::TheftNotConfirmed(_) => "theft_not_confirmed",
            Self::CoverageExceeded { .. } => "coverage_exceeded",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RepairNotAllowed { .. } => "repair_not_allowed",
            Self::RepairOrderExists(_) => "repair_order_exists",
            Self::Validation(_) => "validation",
            Self::Busy { .. } => "busy",
            Self::Repo(_) => "repo",
        }
    }

    fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl ContentionError for LifecycleError {
    fn is_contention(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_contention())
    }

    fn busy(operation: &'static str, attempts: u32) -> Self {
        Self::Busy {
            operation,
            attempts,
        }
    }
}

/// Input for [`LifecycleManager::create_contract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRequest {
    pub username: String,
    pub item_id: ItemId,
    pub contract_type_id: ContractTypeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Input for [`LifecycleManager::file_claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub contract_id: ContractId,
    pub date: NaiveDate,
    pub description: String,
    pub is_theft: bool,
    /// Requested amount; clamped to the item price and remaining coverage.
    pub reimbursable_request: Cents,
}

/// Lifecycle service facade over one connection.
pub struct LifecycleManager<'conn, G: IdGenerator = RandomIds> {
    conn: &'conn Connection,
    ids: G,
    config: LedgerConfig,
}

impl<'conn> LifecycleManager<'conn, RandomIds> {
    /// Creates a manager with random ids and default tuning.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, LifecycleError> {
        Self::with_parts(conn, RandomIds, LedgerConfig::default())
    }
}

impl<'conn, G: IdGenerator> LifecycleManager<'conn, G> {
    /// Creates a manager after verifying the connection carries the ledger
    /// schema. The connection's busy timeout is left as the caller set it.
    pub fn with_parts(
        conn: &'conn Connection,
        ids: G,
        config: LedgerConfig,
    ) -> Result<Self, LifecycleError> {
        ensure_ledger_schema(conn).map_err(RepoError::from)?;
        Ok(Self { conn, ids, config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Creates a contract and appends it to the holder's contract index.
    pub fn create_contract(&self, request: &ContractRequest) -> Result<Contract, LifecycleError> {
        let result = self.run("create_contract", |repo| {
            let username = normalize_username(&request.username)?;
            let mut user = repo
                .get_user(&username)?
                .ok_or_else(|| LifecycleError::not_found("user", &username))?;
            let item = repo
                .get_item(request.item_id)?
                .ok_or_else(|| LifecycleError::not_found("item", request.item_id))?;
            let contract_type = repo
                .get_contract_type(request.contract_type_id)?
                .ok_or_else(|| {
                    LifecycleError::not_found("contract_type", request.contract_type_id)
                })?;
            if !contract_type.active {
                return Err(LifecycleError::ContractTypeInactive(contract_type.id));
            }

            let days = (request.end_date - request.start_date).num_days();
            if days < 1 || !contract_type.allows_duration(days) {
                return Err(LifecycleError::InvalidDuration {
                    days,
                    min: contract_type.min_duration_days,
                    max: contract_type.max_duration_days,
                });
            }

            if let Some(existing) = repo
                .list_contracts_for_item(item.id)?
                .into_iter()
                .find(|c| c.is_active() && c.overlaps(request.start_date, request.end_date))
            {
                return Err(LifecycleError::ItemConflict {
                    item_id: item.id,
                    contract_id: existing.id,
                });
            }

            let contract = Contract::new(
                self.ids.next_id(),
                username,
                item.id,
                contract_type.id,
                request.start_date,
                request.end_date,
            )?;

            // User aggregate first, then the contract row.
            user.contract_index.push(contract.id);
            repo.update_user(&user)?;
            repo.insert_contract(&contract)?;
            Ok(contract)
        });
        log_outcome("contract_create", &result, request.item_id);
        result
    }

    /// Marks a contract void. Voiding a void contract is a no-op.
    pub fn void_contract(&self, contract_id: ContractId) -> Result<(), LifecycleError> {
        let result = self.run("void_contract", |repo| {
            let mut contract = load_contract(repo, contract_id)?;
            if contract.void {
                return Ok(());
            }
            contract.void = true;
            repo.update_contract(&contract)?;
            Ok(())
        });
        log_outcome("contract_void", &result, contract_id);
        result
    }

    /// Files a claim against an active contract.
    ///
    /// The stored `reimbursable` is the request clamped to `[0, item.price]`
    /// and capped by the coverage still available on the contract.
    pub fn file_claim(&self, request: &ClaimRequest) -> Result<Claim, LifecycleError> {
        let result = self.run("file_claim", |repo| {
            let mut contract = load_contract(repo, request.contract_id)?;
            if contract.void {
                return Err(LifecycleError::ContractVoided(contract.id));
            }
            if !contract.covers(request.date) {
                return Err(LifecycleError::OutOfCoverageWindow {
                    date: request.date,
                    start: contract.start_date,
                    end: contract.end_date,
                });
            }
            let contract_type = repo
                .get_contract_type(contract.contract_type_id)?
                .ok_or_else(|| {
                    LifecycleError::not_found("contract_type", contract.contract_type_id)
                })?;
            if request.is_theft && !contract_type.theft_insured {
                return Err(LifecycleError::TheftNotCovered(contract.id));
            }
            let item = repo
                .get_item(contract.item_id)?
                .ok_or_else(|| LifecycleError::not_found("item", contract.item_id))?;

            let committed = committed_total(&repo.list_claims_for_contract(contract.id)?, None);
            let remaining = contract_type.max_sum_insured.saturating_sub(committed).max(0);
            let requested = request.reimbursable_request.clamp(0, item.price.max(0));
            if requested > 0 && remaining == 0 {
                return Err(LifecycleError::CoverageExceeded {
                    contract_id: contract.id,
                    limit: contract_type.max_sum_insured,
                    committed,
                    requested,
                });
            }

            let claim = Claim::filed(
                self.ids.next_id(),
                contract.id,
                request.date,
                request.description.trim(),
                request.is_theft,
                requested.min(remaining),
            );
            repo.insert_claim(&claim)?;
            contract.claim_index.push(claim.id);
            repo.update_contract(&contract)?;
            Ok(claim)
        });
        log_outcome("claim_file", &result, request.contract_id);
        result
    }

    /// Moves a claim to `new_status`.
    ///
    /// Entering `Approved` re-checks the running coverage total. A theft claim
    /// reaching `Paid` voids its contract in the same transaction.
    pub fn transition_claim_status(
        &self,
        claim_id: ClaimId,
        new_status: ClaimStatus,
    ) -> Result<(), LifecycleError> {
        let result = self.run("transition_claim_status", |repo| {
            let mut claim = load_claim(repo, claim_id)?;
            let mut contract = load_contract(repo, claim.contract_id)?;
            if !claim.status.can_transition_to(new_status) {
                return Err(LifecycleError::InvalidTransition {
                    claim_id,
                    from: claim.status,
                    to: new_status,
                });
            }

            if new_status == ClaimStatus::Approved {
                if claim.is_theft && !claim.theft_confirmed() {
                    return Err(LifecycleError::TheftNotConfirmed(claim_id));
                }
                let contract_type = repo
                    .get_contract_type(contract.contract_type_id)?
                    .ok_or_else(|| {
                        LifecycleError::not_found("contract_type", contract.contract_type_id)
                    })?;
                let committed = committed_total(
                    &repo.list_claims_for_contract(contract.id)?,
                    Some(claim_id),
                );
                let within_limit = committed
                    .checked_add(claim.reimbursable)
                    .is_some_and(|total| total <= contract_type.max_sum_insured);
                if !within_limit {
                    return Err(LifecycleError::CoverageExceeded {
                        contract_id: contract.id,
                        limit: contract_type.max_sum_insured,
                        committed,
                        requested: claim.reimbursable,
                    });
                }
            }

            claim.status = new_status;
            repo.update_claim(&claim)?;
            if new_status == ClaimStatus::Paid && claim.is_theft {
                contract.void = true;
            }
            repo.update_contract(&contract)?;
            Ok(())
        });
        match &result {
            Ok(()) => info!(
                "event=claim_transition module=lifecycle status=ok claim_id={claim_id} to={new_status}"
            ),
            Err(err) => warn!(
                "event=claim_transition module=lifecycle status=error claim_id={claim_id} to={new_status} error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Records the police outcome for a filed theft claim.
    ///
    /// The file reference and outcome are stored either way; an unconfirmed
    /// theft moves the claim to `Rejected` and can never be approved.
    pub fn record_police_report(
        &self,
        claim_id: ClaimId,
        theft_confirmed: bool,
        file_reference: &str,
    ) -> Result<(), LifecycleError> {
        let file_reference = file_reference.trim();
        if file_reference.is_empty() {
            return Err(ValidationError::EmptyField("claim.file_reference").into());
        }
        let result = self.run("record_police_report", |repo| {
            let mut claim = load_claim(repo, claim_id)?;
            let contract = load_contract(repo, claim.contract_id)?;
            let outcome = if theft_confirmed {
                ClaimStatus::Filed
            } else {
                ClaimStatus::Rejected
            };
            if !claim.is_theft
                || claim.status != ClaimStatus::Filed
                || claim.file_reference.is_some()
            {
                return Err(LifecycleError::InvalidTransition {
                    claim_id,
                    from: claim.status,
                    to: outcome,
                });
            }
            claim.file_reference = Some(file_reference.to_string());
            claim.police_confirmed = theft_confirmed;
            claim.status = outcome;
            repo.update_claim(&claim)?;
            repo.update_contract(&contract)?;
            Ok(())
        });
        log_outcome("police_report", &result, claim_id);
        result
    }

    /// Opens a repair order for an approved or paid, non-theft claim.
    pub fn open_repair_order(&self, claim_id: ClaimId) -> Result<RepairOrder, LifecycleError> {
        let result = self.run("open_repair_order", |repo| {
            let claim = load_claim(repo, claim_id)?;
            if !matches!(claim.status, ClaimStatus::Approved | ClaimStatus::Paid) {
                return Err(LifecycleError::RepairNotAllowed {
                    claim_id,
                    reason: "claim is not approved",
                });
            }
            if claim.is_theft {
                return Err(LifecycleError::RepairNotAllowed {
                    claim_id,
                    reason: "stolen items cannot be repaired",
                });
            }
            if claim.repaired {
                return Err(LifecycleError::RepairNotAllowed {
                    claim_id,
                    reason: "claim is already repaired",
                });
            }
            if repo.get_repair_order_for_claim(claim_id)?.is_some() {
                return Err(LifecycleError::RepairOrderExists(claim_id));
            }
            let contract = load_contract(repo, claim.contract_id)?;
            let order = RepairOrder {
                id: self.ids.next_id(),
                claim_id,
                contract_id: contract.id,
                item_id: contract.item_id,
                ready: false,
            };
            repo.insert_repair_order(&order)?;
            repo.update_contract(&contract)?;
            Ok(order)
        });
        log_outcome("repair_open", &result, claim_id);
        result
    }

    /// Marks a repair order ready and its claim repaired. Idempotent.
    pub fn close_repair_order(&self, repair_order_id: RepairOrderId) -> Result<(), LifecycleError> {
        let result = self.run("close_repair_order", |repo| {
            let mut order = repo
                .get_repair_order(repair_order_id)?
                .ok_or_else(|| LifecycleError::not_found("repair_order", repair_order_id))?;
            if order.ready {
                return Ok(());
            }
            let mut claim = load_claim(repo, order.claim_id)?;
            let contract = load_contract(repo, order.contract_id)?;
            order.ready = true;
            claim.repaired = true;
            repo.update_repair_order(&order)?;
            repo.update_claim(&claim)?;
            repo.update_contract(&contract)?;
            Ok(())
        });
        log_outcome("repair_close", &result, repair_order_id);
        result
    }

    fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T, LifecycleError>
    where
        F: FnMut(&SqliteLedgerRepository<'_>) -> Result<T, LifecycleError>,
    {
        with_transaction(self.conn, &self.config, operation, work)
    }
}

/// Sum of reimbursements that count toward the coverage limit.
///
/// Saturates at `Cents::MAX`, which exceeds any storable limit.
pub fn committed_total(claims: &[Claim], excluding: Option<ClaimId>) -> Cents {
    claims
        .iter()
        .filter(|claim| Some(claim.id) != excluding && claim.status.counts_toward_coverage())
        .fold(0, |total: Cents, claim| total.saturating_add(claim.reimbursable))
}

fn load_contract<R: LedgerRepository>(
    repo: &R,
    contract_id: ContractId,
) -> Result<Contract, LifecycleError> {
    repo.get_contract(contract_id)?
        .ok_or_else(|| LifecycleError::not_found("contract", contract_id))
}

fn load_claim<R: LedgerRepository>(repo: &R, claim_id: ClaimId) -> Result<Claim, LifecycleError> {
    repo.get_claim(claim_id)?
        .ok_or_else(|| LifecycleError::not_found("claim", claim_id))
}

fn log_outcome<T>(event: &'static str, result: &Result<T, LifecycleError>, target: impl Display) {
    match result {
        Ok(_) => info!("event={event} module=lifecycle status=ok target={target}"),
        Err(err) => warn!(
            "event={event} module=lifecycle status=error target={target} error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::committed_total;
    use crate::model::claim::{Claim, ClaimStatus};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn claim(n: u128, status: ClaimStatus, amount: i64) -> Claim {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut claim = Claim::filed(
            Uuid::from_u128(n),
            Uuid::from_u128(99),
            date,
            "",
            false,
            amount,
        );
        claim.status = status;
        claim
    }

    #[test]
    fn committed_total_counts_only_approved_and_paid() {
        let claims = vec![
            claim(1, ClaimStatus::Filed, 100),
            claim(2, ClaimStatus::Approved, 200),
            claim(3, ClaimStatus::Paid, 50),
            claim(4, ClaimStatus::Rejected, 400),
        ];
        assert_eq!(committed_total(&claims, None), 250);
        assert_eq!(committed_total(&claims, Some(Uuid::from_u128(2))), 50);
    }

    #[test]
    fn committed_total_saturates_instead_of_overflowing() {
        let claims = vec![
            claim(1, ClaimStatus::Approved, i64::MAX - 1),
            claim(2, ClaimStatus::Paid, 10),
        ];
        assert_eq!(committed_total(&claims, None), i64::MAX);
    }
}
