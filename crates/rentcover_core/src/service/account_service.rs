//! User account service.
//!
//! # Responsibility
//! - Register users with normalized usernames and Argon2id password hashes.
//! - Authenticate, rotate passwords, and expose credential-free profiles.
//!
//! # Invariants
//! - Plaintext passwords never reach storage or logs.
//! - A new user starts with an empty contract index.

use crate::config::LedgerConfig;
use crate::model::user::{normalize_username, User, UserProfile};
use crate::model::ValidationError;
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoError;
use crate::service::password::{hash_password, verify_password};
use crate::service::transaction::{with_transaction, ContentionError};
use log::{info, warn};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username is already taken: {0}")]
    UsernameTaken(String),
    #[error("password must be at least {min_len} characters long")]
    WeakPassword { min_len: usize },
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
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

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate { id, .. } => Self::UsernameTaken(id),
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

impl ContentionError for AccountError {
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

/// Account service facade.
pub struct AccountService<'conn> {
    conn: &'conn Connection,
    config: LedgerConfig,
}

impl<'conn> AccountService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> Result<Self, AccountError> {
        Self::with_config(conn, LedgerConfig::default())
    }

    pub fn with_config(conn: &'conn Connection, config: LedgerConfig) -> Result<Self, AccountError> {
        SqliteLedgerRepository::try_new(conn)?;
        Ok(Self { conn, config })
    }

    /// Registers a new user.
    pub fn register_user(
        &self,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AccountError> {
        let username = normalize_username(username)?;
        self.check_strength(password)?;
        let user = User {
            username,
            password_hash: hash_password(password)?,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            contract_index: Vec::new(),
            version: 0,
        };
        let result = with_transaction(self.conn, &self.config, "register_user", |repo| {
            repo.insert_user(&user).map_err(AccountError::from)
        });
        match &result {
            Ok(()) => info!(
                "event=user_register module=account status=ok username={}",
                user.username
            ),
            Err(AccountError::UsernameTaken(_)) => warn!(
                "event=user_register module=account status=error error_code=username_taken"
            ),
            Err(_) => warn!("event=user_register module=account status=error"),
        }
        result.map(|()| user)
    }

    /// Checks credentials. Unknown users authenticate as `false`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, AccountError> {
        let Ok(username) = normalize_username(username) else {
            return Ok(false);
        };
        let Some(user) = self.repo().get_user(&username)? else {
            return Ok(false);
        };
        let verified = verify_password(password, &user.password_hash)?;
        if !verified {
            warn!("event=user_auth module=account status=denied username={username}");
        }
        Ok(verified)
    }

    pub fn update_password(&self, username: &str, new_password: &str) -> Result<(), AccountError> {
        let username = normalize_username(username)?;
        self.check_strength(new_password)?;
        let password_hash = hash_password(new_password)?;
        with_transaction(self.conn, &self.config, "update_password", |repo| {
            let mut user = repo
                .get_user(&username)?
                .ok_or_else(|| AccountError::NotFound(username.clone()))?;
            user.password_hash = password_hash.clone();
            repo.update_user(&user)?;
            Ok::<(), AccountError>(())
        })?;
        info!("event=user_password module=account status=ok username={username}");
        Ok(())
    }

    pub fn get_profile(&self, username: &str) -> Result<UserProfile, AccountError> {
        let username = normalize_username(username)?;
        self.repo()
            .get_user(&username)?
            .map(|user| user.profile())
            .ok_or(AccountError::NotFound(username))
    }

    fn check_strength(&self, password: &str) -> Result<(), AccountError> {
        if password.chars().count() < self.config.min_password_len {
            return Err(AccountError::WeakPassword {
                min_len: self.config.min_password_len,
            });
        }
        Ok(())
    }

    fn repo(&self) -> SqliteLedgerRepository<'conn> {
        SqliteLedgerRepository::new_unchecked(self.conn)
    }
}
