//! Contract type and item catalog service.
//!
//! # Responsibility
//! - Register contract types and insured items.
//! - Toggle contract type availability for new contracts.
//!
//! Existing contracts keep their contract type even after it is deactivated.

use crate::config::LedgerConfig;
use crate::ids::{IdGenerator, RandomIds};
use crate::model::contract_type::{ContractType, ContractTypeId, NewContractType};
use crate::model::item::{Item, ItemId, NewItem};
use crate::model::ValidationError;
use crate::repo::ledger_repo::{ContractTypeFilter, LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoError;
use crate::service::transaction::{with_transaction, ContentionError};
use log::info;
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
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

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl ContentionError for CatalogError {
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

/// Catalog service facade.
pub struct CatalogService<'conn, G: IdGenerator = RandomIds> {
    conn: &'conn Connection,
    ids: G,
    config: LedgerConfig,
}

impl<'conn> CatalogService<'conn, RandomIds> {
    pub fn try_new(conn: &'conn Connection) -> Result<Self, CatalogError> {
        Self::with_parts(conn, RandomIds, LedgerConfig::default())
    }
}

impl<'conn, G: IdGenerator> CatalogService<'conn, G> {
    pub fn with_parts(
        conn: &'conn Connection,
        ids: G,
        config: LedgerConfig,
    ) -> Result<Self, CatalogError> {
        SqliteLedgerRepository::try_new(conn)?;
        Ok(Self { conn, ids, config })
    }

    pub fn create_contract_type(
        &self,
        input: NewContractType,
    ) -> Result<ContractType, CatalogError> {
        let contract_type = ContractType::from_new(self.ids.next_id(), input)?;
        with_transaction(self.conn, &self.config, "create_contract_type", |repo| {
            repo.insert_contract_type(&contract_type)
                .map_err(CatalogError::from)
        })?;
        info!(
            "event=contract_type_create module=catalog status=ok contract_type_id={} theft_insured={}",
            contract_type.id, contract_type.theft_insured
        );
        Ok(contract_type)
    }

    pub fn set_contract_type_active(
        &self,
        id: ContractTypeId,
        active: bool,
    ) -> Result<(), CatalogError> {
        with_transaction(self.conn, &self.config, "set_contract_type_active", |repo| {
            repo.set_contract_type_active(id, active)
                .map_err(CatalogError::from)
        })?;
        info!("event=contract_type_toggle module=catalog status=ok contract_type_id={id} active={active}");
        Ok(())
    }

    pub fn get_contract_type(&self, id: ContractTypeId) -> Result<ContractType, CatalogError> {
        self.repo()
            .get_contract_type(id)?
            .ok_or_else(|| CatalogError::NotFound {
                entity: "contract_type",
                id: id.to_string(),
            })
    }

    /// Lists contract types.
    ///
    /// With `shop_type`, only active types whose shop type contains the
    /// filter (case-insensitive) are returned; without it, every type.
    pub fn list_contract_types(
        &self,
        shop_type: Option<&str>,
    ) -> Result<Vec<ContractType>, CatalogError> {
        let filter = match shop_type.map(str::trim) {
            Some(value) => ContractTypeFilter {
                shop_type: Some(value.to_string()),
                active_only: true,
            },
            None => ContractTypeFilter::default(),
        };
        Ok(self.repo().list_contract_types(&filter)?)
    }

    pub fn register_item(&self, input: &NewItem) -> Result<Item, CatalogError> {
        input.validate()?;
        let item = with_transaction(self.conn, &self.config, "register_item", |repo| {
            repo.insert_item(input).map_err(CatalogError::from)
        })?;
        info!(
            "event=item_register module=catalog status=ok item_id={} price={}",
            item.id, item.price
        );
        Ok(item)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.repo()
            .get_item(id)?
            .ok_or_else(|| CatalogError::NotFound {
                entity: "item",
                id: id.to_string(),
            })
    }

    fn repo(&self) -> SqliteLedgerRepository<'conn> {
        SqliteLedgerRepository::new_unchecked(self.conn)
    }
}
