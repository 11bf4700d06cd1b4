//! Ledger repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level access to contract types, items, users, contracts,
//!   claims and repair orders.
//! - Encode/decode closed enums, flags and denormalized JSON indexes.
//!
//! # Invariants
//! - Write paths call model `validate()` before SQL mutations.
//! - `update_user` / `update_contract` succeed only when the stored `version`
//!   equals the caller's copy, and return the bumped version.
//! - The repository never opens transactions; callers own the unit of work.

use super::{RepoError, RepoResult};
use crate::db::migrations::ensure_ledger_schema;
use crate::model::claim::{Claim, ClaimId, ClaimStatus};
use crate::model::contract::{Contract, ContractId};
use crate::model::contract_type::{ContractType, ContractTypeId};
use crate::model::item::{Item, ItemId, NewItem};
use crate::model::repair_order::{RepairOrder, RepairOrderId};
use crate::model::user::User;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Row};
use uuid::Uuid;

const CONTRACT_TYPE_SELECT_SQL: &str = "SELECT
    id,
    shop_type,
    formula_per_day,
    max_sum_insured,
    theft_insured,
    description,
    conditions,
    active,
    min_duration_days,
    max_duration_days
FROM contract_types";

const ITEM_SELECT_SQL: &str = "SELECT id, brand, model, price, description, serial_no FROM items";

const USER_SELECT_SQL: &str = "SELECT
    username,
    password,
    first_name,
    last_name,
    contract_index,
    version
FROM users";

const CONTRACT_SELECT_SQL: &str = "SELECT
    id,
    username,
    item_id,
    contract_type_id,
    start_date,
    end_date,
    void,
    claim_index,
    version
FROM contracts";

const CLAIM_SELECT_SQL: &str = "SELECT
    id,
    contract_id,
    date,
    description,
    is_theft,
    status,
    reimbursable,
    repaired,
    file_reference,
    police_confirmed
FROM claims";

const REPAIR_ORDER_SELECT_SQL: &str =
    "SELECT id, claim_id, contract_id, item_id, ready FROM repair_orders";

/// Filter for contract type listings.
#[derive(Debug, Clone, Default)]
pub struct ContractTypeFilter {
    /// Case-insensitive substring of `shop_type`.
    pub shop_type: Option<String>,
    pub active_only: bool,
}

/// Filter for claim listings.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub theft_only: bool,
    /// Only theft claims without a police file reference.
    pub awaiting_police: bool,
}

/// Storage boundary used by ledger services.
pub trait LedgerRepository {
    fn insert_contract_type(&self, contract_type: &ContractType) -> RepoResult<()>;
    fn get_contract_type(&self, id: ContractTypeId) -> RepoResult<Option<ContractType>>;
    fn set_contract_type_active(&self, id: ContractTypeId, active: bool) -> RepoResult<()>;
    fn list_contract_types(&self, filter: &ContractTypeFilter) -> RepoResult<Vec<ContractType>>;

    fn insert_item(&self, item: &NewItem) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;

    fn insert_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, username: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Version-checked write of credentials, names and contract index.
    fn update_user(&self, user: &User) -> RepoResult<i64>;

    fn insert_contract(&self, contract: &Contract) -> RepoResult<()>;
    fn get_contract(&self, id: ContractId) -> RepoResult<Option<Contract>>;
    /// Version-checked write of `void` and the claim index.
    fn update_contract(&self, contract: &Contract) -> RepoResult<i64>;
    fn list_contracts(&self, username: Option<&str>) -> RepoResult<Vec<Contract>>;
    fn list_contracts_for_item(&self, item_id: ItemId) -> RepoResult<Vec<Contract>>;

    fn insert_claim(&self, claim: &Claim) -> RepoResult<()>;
    fn get_claim(&self, id: ClaimId) -> RepoResult<Option<Claim>>;
    fn update_claim(&self, claim: &Claim) -> RepoResult<()>;
    fn list_claims_for_contract(&self, contract_id: ContractId) -> RepoResult<Vec<Claim>>;
    fn list_claims(&self, filter: &ClaimFilter) -> RepoResult<Vec<Claim>>;

    fn insert_repair_order(&self, order: &RepairOrder) -> RepoResult<()>;
    fn get_repair_order(&self, id: RepairOrderId) -> RepoResult<Option<RepairOrder>>;
    fn get_repair_order_for_claim(&self, claim_id: ClaimId) -> RepoResult<Option<RepairOrder>>;
    fn update_repair_order(&self, order: &RepairOrder) -> RepoResult<()>;
    fn list_repair_orders(&self, include_ready: bool) -> RepoResult<Vec<RepairOrder>>;
}

/// SQLite-backed ledger repository.
///
/// Works on a plain connection or on a `Transaction` (via deref).
#[derive(Debug)]
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    /// Creates a repository after verifying the connection's schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_ledger_schema(conn)?;
        Ok(Self { conn })
    }

    /// Creates a repository on a connection already verified by the caller.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn insert_contract_type(&self, contract_type: &ContractType) -> RepoResult<()> {
        contract_type.validate()?;
        self.conn
            .execute(
                "INSERT INTO contract_types (
                    id,
                    shop_type,
                    formula_per_day,
                    max_sum_insured,
                    theft_insured,
                    description,
                    conditions,
                    active,
                    min_duration_days,
                    max_duration_days
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    contract_type.id.to_string(),
                    contract_type.shop_type.as_str(),
                    contract_type.formula_per_day.as_str(),
                    contract_type.max_sum_insured,
                    bool_to_int(contract_type.theft_insured),
                    contract_type.description.as_str(),
                    contract_type.conditions.as_str(),
                    bool_to_int(contract_type.active),
                    contract_type.min_duration_days,
                    contract_type.max_duration_days,
                ],
            )
            .map_err(|err| map_duplicate(err, "contract_type", contract_type.id))?;
        Ok(())
    }

    fn get_contract_type(&self, id: ContractTypeId) -> RepoResult<Option<ContractType>> {
        query_optional(
            self.conn,
            &format!("{CONTRACT_TYPE_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            parse_contract_type_row,
        )
    }

    fn set_contract_type_active(&self, id: ContractTypeId, active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE contract_types SET active = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(active)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("contract_type", id));
        }
        Ok(())
    }

    fn list_contract_types(&self, filter: &ContractTypeFilter) -> RepoResult<Vec<ContractType>> {
        let mut sql = format!("{CONTRACT_TYPE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(shop_type) = filter.shop_type.as_deref() {
            sql.push_str(" AND instr(upper(shop_type), upper(?)) > 0");
            bind_values.push(Value::Text(shop_type.trim().to_string()));
        }
        if filter.active_only {
            sql.push_str(" AND active = 1");
        }
        sql.push_str(" ORDER BY shop_type ASC, id ASC;");

        query_all(
            self.conn,
            &sql,
            params_from_iter(bind_values),
            parse_contract_type_row,
        )
    }

    fn insert_item(&self, item: &NewItem) -> RepoResult<Item> {
        item.validate()?;
        self.conn.execute(
            "INSERT INTO items (brand, model, price, description, serial_no)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                item.brand.as_str(),
                item.model.as_str(),
                item.price,
                item.description.as_str(),
                item.serial_no.trim(),
            ],
        )?;
        Ok(Item {
            id: self.conn.last_insert_rowid(),
            brand: item.brand.clone(),
            model: item.model.clone(),
            price: item.price,
            description: item.description.clone(),
            serial_no: item.serial_no.trim().to_string(),
        })
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        query_optional(
            self.conn,
            &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_item_row,
        )
    }

    fn insert_user(&self, user: &User) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO users (
                    username,
                    password,
                    first_name,
                    last_name,
                    contract_index,
                    version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    user.username.as_str(),
                    user.password_hash.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    encode_index(&user.contract_index)?,
                    user.version,
                ],
            )
            .map_err(|err| map_duplicate(err, "user", &user.username))?;
        Ok(())
    }

    fn get_user(&self, username: &str) -> RepoResult<Option<User>> {
        query_optional(
            self.conn,
            &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
            [username],
            parse_user_row,
        )
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        query_all(
            self.conn,
            &format!("{USER_SELECT_SQL} ORDER BY username ASC;"),
            [],
            parse_user_row,
        )
    }

    fn update_user(&self, user: &User) -> RepoResult<i64> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                password = ?2,
                first_name = ?3,
                last_name = ?4,
                contract_index = ?5,
                version = version + 1
             WHERE username = ?1
               AND version = ?6;",
            params![
                user.username.as_str(),
                user.password_hash.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                encode_index(&user.contract_index)?,
                user.version,
            ],
        )?;
        if changed == 0 {
            return Err(self.missing_or_stale(
                "users",
                "username",
                "user",
                &user.username,
                user.version,
            )?);
        }
        Ok(user.version + 1)
    }

    fn insert_contract(&self, contract: &Contract) -> RepoResult<()> {
        contract.validate()?;
        self.conn
            .execute(
                "INSERT INTO contracts (
                    id,
                    username,
                    item_id,
                    contract_type_id,
                    start_date,
                    end_date,
                    void,
                    claim_index,
                    version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    contract.id.to_string(),
                    contract.username.as_str(),
                    contract.item_id,
                    contract.contract_type_id.to_string(),
                    contract.start_date,
                    contract.end_date,
                    bool_to_int(contract.void),
                    encode_index(&contract.claim_index)?,
                    contract.version,
                ],
            )
            .map_err(|err| map_duplicate(err, "contract", contract.id))?;
        Ok(())
    }

    fn get_contract(&self, id: ContractId) -> RepoResult<Option<Contract>> {
        query_optional(
            self.conn,
            &format!("{CONTRACT_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            parse_contract_row,
        )
    }

    fn update_contract(&self, contract: &Contract) -> RepoResult<i64> {
        contract.validate()?;
        let changed = self.conn.execute(
            "UPDATE contracts
             SET
                void = ?2,
                claim_index = ?3,
                version = version + 1
             WHERE id = ?1
               AND version = ?4;",
            params![
                contract.id.to_string(),
                bool_to_int(contract.void),
                encode_index(&contract.claim_index)?,
                contract.version,
            ],
        )?;
        if changed == 0 {
            return Err(self.missing_or_stale(
                "contracts",
                "id",
                "contract",
                &contract.id.to_string(),
                contract.version,
            )?);
        }
        Ok(contract.version + 1)
    }

    fn list_contracts(&self, username: Option<&str>) -> RepoResult<Vec<Contract>> {
        match username {
            Some(username) => query_all(
                self.conn,
                &format!(
                    "{CONTRACT_SELECT_SQL} WHERE username = ?1 ORDER BY created_at ASC, rowid ASC;"
                ),
                [username],
                parse_contract_row,
            ),
            None => query_all(
                self.conn,
                &format!("{CONTRACT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"),
                [],
                parse_contract_row,
            ),
        }
    }

    fn list_contracts_for_item(&self, item_id: ItemId) -> RepoResult<Vec<Contract>> {
        query_all(
            self.conn,
            &format!("{CONTRACT_SELECT_SQL} WHERE item_id = ?1 ORDER BY start_date ASC, id ASC;"),
            [item_id],
            parse_contract_row,
        )
    }

    fn insert_claim(&self, claim: &Claim) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO claims (
                    id,
                    contract_id,
                    date,
                    description,
                    is_theft,
                    status,
                    reimbursable,
                    repaired,
                    file_reference,
                    police_confirmed
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    claim.id.to_string(),
                    claim.contract_id.to_string(),
                    claim.date,
                    claim.description.as_str(),
                    bool_to_int(claim.is_theft),
                    claim.status.as_code(),
                    claim.reimbursable,
                    bool_to_int(claim.repaired),
                    claim.file_reference.as_deref(),
                    bool_to_int(claim.police_confirmed),
                ],
            )
            .map_err(|err| map_duplicate(err, "claim", claim.id))?;
        Ok(())
    }

    fn get_claim(&self, id: ClaimId) -> RepoResult<Option<Claim>> {
        query_optional(
            self.conn,
            &format!("{CLAIM_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            parse_claim_row,
        )
    }

    fn update_claim(&self, claim: &Claim) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE claims
             SET
                status = ?2,
                reimbursable = ?3,
                repaired = ?4,
                file_reference = ?5,
                police_confirmed = ?6
             WHERE id = ?1;",
            params![
                claim.id.to_string(),
                claim.status.as_code(),
                claim.reimbursable,
                bool_to_int(claim.repaired),
                claim.file_reference.as_deref(),
                bool_to_int(claim.police_confirmed),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("claim", claim.id));
        }
        Ok(())
    }

    fn list_claims_for_contract(&self, contract_id: ContractId) -> RepoResult<Vec<Claim>> {
        query_all(
            self.conn,
            &format!(
                "{CLAIM_SELECT_SQL} WHERE contract_id = ?1 ORDER BY created_at ASC, rowid ASC;"
            ),
            [contract_id.to_string()],
            parse_claim_row,
        )
    }

    fn list_claims(&self, filter: &ClaimFilter) -> RepoResult<Vec<Claim>> {
        let mut sql = format!("{CLAIM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_code().to_string()));
        }
        if filter.theft_only || filter.awaiting_police {
            sql.push_str(" AND is_theft = 1");
        }
        if filter.awaiting_police {
            sql.push_str(" AND file_reference IS NULL");
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC;");

        query_all(self.conn, &sql, params_from_iter(bind_values), parse_claim_row)
    }

    fn insert_repair_order(&self, order: &RepairOrder) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO repair_orders (id, claim_id, contract_id, item_id, ready)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    order.id.to_string(),
                    order.claim_id.to_string(),
                    order.contract_id.to_string(),
                    order.item_id,
                    bool_to_int(order.ready),
                ],
            )
            .map_err(|err| map_duplicate(err, "repair_order", order.claim_id))?;
        Ok(())
    }

    fn get_repair_order(&self, id: RepairOrderId) -> RepoResult<Option<RepairOrder>> {
        query_optional(
            self.conn,
            &format!("{REPAIR_ORDER_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            parse_repair_order_row,
        )
    }

    fn get_repair_order_for_claim(&self, claim_id: ClaimId) -> RepoResult<Option<RepairOrder>> {
        query_optional(
            self.conn,
            &format!("{REPAIR_ORDER_SELECT_SQL} WHERE claim_id = ?1;"),
            [claim_id.to_string()],
            parse_repair_order_row,
        )
    }

    fn update_repair_order(&self, order: &RepairOrder) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE repair_orders SET ready = ?2 WHERE id = ?1;",
            params![order.id.to_string(), bool_to_int(order.ready)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("repair_order", order.id));
        }
        Ok(())
    }

    fn list_repair_orders(&self, include_ready: bool) -> RepoResult<Vec<RepairOrder>> {
        let sql = if include_ready {
            format!("{REPAIR_ORDER_SELECT_SQL} ORDER BY rowid ASC;")
        } else {
            format!("{REPAIR_ORDER_SELECT_SQL} WHERE ready = 0 ORDER BY rowid ASC;")
        };
        query_all(self.conn, &sql, [], parse_repair_order_row)
    }
}

impl SqliteLedgerRepository<'_> {
    /// Distinguishes a missing aggregate row from a lost version race.
    fn missing_or_stale(
        &self,
        table: &'static str,
        key_column: &'static str,
        entity: &'static str,
        key: &str,
        expected: i64,
    ) -> RepoResult<RepoError> {
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {key_column} = ?1);"),
            [key],
            |row| row.get(0),
        )?;
        Ok(if exists == 1 {
            RepoError::StaleVersion {
                entity,
                id: key.to_string(),
                expected,
            }
        } else {
            RepoError::not_found(entity, key)
        })
    }
}

fn query_optional<P, T>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

fn query_all<P, T>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

fn map_duplicate(err: rusqlite::Error, entity: &'static str, id: impl ToString) -> RepoError {
    let duplicate = matches!(
        &err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                )
    );
    if duplicate {
        RepoError::Duplicate {
            entity,
            id: id.to_string(),
        }
    } else {
        err.into()
    }
}

fn parse_contract_type_row(row: &Row<'_>) -> RepoResult<ContractType> {
    let contract_type = ContractType {
        id: parse_uuid(row, "id", "contract_types.id")?,
        shop_type: row.get("shop_type")?,
        formula_per_day: row.get("formula_per_day")?,
        max_sum_insured: row.get("max_sum_insured")?,
        theft_insured: parse_flag(row, "theft_insured", "contract_types.theft_insured")?,
        description: row.get("description")?,
        conditions: row.get("conditions")?,
        active: parse_flag(row, "active", "contract_types.active")?,
        min_duration_days: row.get("min_duration_days")?,
        max_duration_days: row.get("max_duration_days")?,
    };
    contract_type.validate()?;
    Ok(contract_type)
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    Ok(Item {
        id: row.get("id")?,
        brand: row.get("brand")?,
        model: row.get("model")?,
        price: row.get("price")?,
        description: row.get("description")?,
        serial_no: row.get("serial_no")?,
    })
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        username: row.get("username")?,
        password_hash: row.get("password")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        contract_index: decode_index(row, "contract_index", "users.contract_index")?,
        version: row.get("version")?,
    })
}

fn parse_contract_row(row: &Row<'_>) -> RepoResult<Contract> {
    let contract = Contract {
        id: parse_uuid(row, "id", "contracts.id")?,
        username: row.get("username")?,
        item_id: row.get("item_id")?,
        contract_type_id: parse_uuid(row, "contract_type_id", "contracts.contract_type_id")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        void: parse_flag(row, "void", "contracts.void")?,
        claim_index: decode_index(row, "claim_index", "contracts.claim_index")?,
        version: row.get("version")?,
    };
    contract.validate()?;
    Ok(contract)
}

fn parse_claim_row(row: &Row<'_>) -> RepoResult<Claim> {
    let status_text: String = row.get("status")?;
    let status = status_text
        .parse::<ClaimStatus>()
        .map_err(|err| RepoError::InvalidData(format!("{err} in claims.status")))?;

    Ok(Claim {
        id: parse_uuid(row, "id", "claims.id")?,
        contract_id: parse_uuid(row, "contract_id", "claims.contract_id")?,
        date: row.get("date")?,
        description: row.get("description")?,
        is_theft: parse_flag(row, "is_theft", "claims.is_theft")?,
        status,
        reimbursable: row.get("reimbursable")?,
        repaired: parse_flag(row, "repaired", "claims.repaired")?,
        file_reference: row.get("file_reference")?,
        police_confirmed: parse_flag(row, "police_confirmed", "claims.police_confirmed")?,
    })
}

fn parse_repair_order_row(row: &Row<'_>) -> RepoResult<RepairOrder> {
    Ok(RepairOrder {
        id: parse_uuid(row, "id", "repair_orders.id")?,
        claim_id: parse_uuid(row, "claim_id", "repair_orders.claim_id")?,
        contract_id: parse_uuid(row, "contract_id", "repair_orders.contract_id")?,
        item_id: row.get("item_id")?,
        ready: parse_flag(row, "ready", "repair_orders.ready")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &'static str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{text}` in {label}")))
}

fn parse_flag(row: &Row<'_>, column: &str, label: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {label}"
        ))),
    }
}

fn decode_index(row: &Row<'_>, column: &str, label: &'static str) -> RepoResult<Vec<Uuid>> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text)
        .map_err(|err| RepoError::InvalidData(format!("invalid index json in {label}: {err}")))
}

fn encode_index(ids: &[Uuid]) -> RepoResult<String> {
    serde_json::to_string(ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode index: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
