//! Contract and claim ledger for rented-item insurance.
//! This crate is the single source of truth for lifecycle and coverage rules.

pub mod config;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::LedgerConfig;
pub use db::{open_db, open_db_in_memory, open_db_with_config, DbError};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::claim::{Claim, ClaimId, ClaimStatus};
pub use model::contract::{Contract, ContractId};
pub use model::contract_type::{ContractType, ContractTypeId, NewContractType};
pub use model::item::{Item, ItemId, NewItem};
pub use model::repair_order::{RepairOrder, RepairOrderId};
pub use model::user::{User, UserProfile};
pub use model::{Cents, ValidationError};
pub use repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountError, AccountService};
pub use service::catalog_service::{CatalogError, CatalogService};
pub use service::integrity::IntegrityReport;
pub use service::lifecycle_service::{
    ClaimRequest, ContractRequest, LifecycleError, LifecycleManager,
};
pub use service::query_service::{ContractWithClaims, LedgerQueries, TheftClaimView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
