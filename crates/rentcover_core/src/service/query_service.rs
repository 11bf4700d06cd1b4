//! Read-side views over the ledger.
//!
//! # Responsibility
//! - List contracts with their claims, claims by status, pending thefts and
//!   open repair orders.
//! - Run the integrity audit against one consistent snapshot.

use crate::model::claim::{Claim, ClaimId, ClaimStatus};
use crate::model::contract::{Contract, ContractId};
use crate::model::item::Item;
use crate::model::repair_order::{RepairOrder, RepairOrderId};
use crate::model::user::normalize_username;
use crate::repo::ledger_repo::{ClaimFilter, LedgerRepository, SqliteLedgerRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::integrity::{check_integrity, IntegrityReport};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractWithClaims {
    pub contract: Contract,
    pub claims: Vec<Claim>,
}

/// Filed theft claim waiting for a police report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TheftClaimView {
    pub claim: Claim,
    pub item: Item,
    pub username: String,
    pub holder_name: String,
}

pub struct LedgerQueries<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LedgerQueries<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        SqliteLedgerRepository::try_new(conn)?;
        Ok(Self { conn })
    }

    pub fn get_contract(&self, id: ContractId) -> RepoResult<Contract> {
        self.repo()
            .get_contract(id)?
            .ok_or_else(|| RepoError::not_found("contract", id))
    }

    pub fn get_claim(&self, id: ClaimId) -> RepoResult<Claim> {
        self.repo()
            .get_claim(id)?
            .ok_or_else(|| RepoError::not_found("claim", id))
    }

    pub fn get_repair_order(&self, id: RepairOrderId) -> RepoResult<RepairOrder> {
        self.repo()
            .get_repair_order(id)?
            .ok_or_else(|| RepoError::not_found("repair_order", id))
    }

    /// Contracts in creation order, optionally for one user, each with its
    /// claims in filing order.
    pub fn list_contracts(&self, username: Option<&str>) -> RepoResult<Vec<ContractWithClaims>> {
        let username = username.map(normalize_username).transpose()?;
        let repo = self.repo();
        repo.list_contracts(username.as_deref())?
            .into_iter()
            .map(|contract| {
                let claims = repo.list_claims_for_contract(contract.id)?;
                Ok(ContractWithClaims { contract, claims })
            })
            .collect()
    }

    pub fn list_claims(&self, status: Option<ClaimStatus>) -> RepoResult<Vec<Claim>> {
        self.repo().list_claims(&ClaimFilter {
            status,
            ..ClaimFilter::default()
        })
    }

    pub fn list_pending_theft_claims(&self) -> RepoResult<Vec<TheftClaimView>> {
        let repo = self.repo();
        let pending = repo.list_claims(&ClaimFilter {
            status: Some(ClaimStatus::Filed),
            theft_only: true,
            awaiting_police: true,
        })?;
        pending
            .into_iter()
            .map(|claim| {
                let contract = repo
                    .get_contract(claim.contract_id)?
                    .ok_or_else(|| RepoError::not_found("contract", claim.contract_id))?;
                let item = repo
                    .get_item(contract.item_id)?
                    .ok_or_else(|| RepoError::not_found("item", contract.item_id))?;
                let user = repo
                    .get_user(&contract.username)?
                    .ok_or_else(|| RepoError::not_found("user", &contract.username))?;
                Ok(TheftClaimView {
                    claim,
                    item,
                    holder_name: user.full_name(),
                    username: user.username,
                })
            })
            .collect()
    }

    pub fn list_repair_orders(&self, include_ready: bool) -> RepoResult<Vec<RepairOrder>> {
        self.repo().list_repair_orders(include_ready)
    }

    /// Audits the whole ledger inside one read transaction.
    pub fn check_integrity(&self) -> RepoResult<IntegrityReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let report = check_integrity(&SqliteLedgerRepository::new_unchecked(&tx))?;
        tx.rollback()?;
        info!(
            "event=integrity_check module=query status=ok clean={} findings={}",
            report.is_clean(),
            report.finding_count()
        );
        Ok(report)
    }

    fn repo(&self) -> SqliteLedgerRepository<'conn> {
        SqliteLedgerRepository::new_unchecked(self.conn)
    }
}
