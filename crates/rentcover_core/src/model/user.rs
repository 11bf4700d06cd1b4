//! Policy holder model.
//!
//! # Invariants
//! - `username` is normalized (trimmed, lowercase) before it is stored or looked up.
//! - `password_hash` is an opaque PHC string; plaintext never reaches this type.

use super::contract::ContractId;
use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{2,31}$").expect("valid username regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Contract ids in creation order. Derived from `contracts.username`.
    pub contract_index: Vec<ContractId>,
    pub version: i64,
}

/// Public view of a user, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub contract_count: usize,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            contract_count: self.contract_index.len(),
        }
    }
}

/// Normalizes and validates a username.
pub fn normalize_username(value: &str) -> Result<String, ValidationError> {
    let normalized = value.trim().to_lowercase();
    if USERNAME_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidUsername(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_username;

    #[test]
    fn normalize_username_lowercases_and_trims() {
        assert_eq!(normalize_username("  Alice.B ").unwrap(), "alice.b");
    }

    #[test]
    fn normalize_username_rejects_short_or_symbolic_names() {
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("bob smith").is_err());
        assert!(normalize_username("_bob").is_err());
    }
}
