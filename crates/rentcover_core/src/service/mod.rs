//! Ledger use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run every mutation as one retried, immediate transaction.

pub mod account_service;
pub mod catalog_service;
pub mod integrity;
pub mod lifecycle_service;
mod password;
pub mod query_service;
mod transaction;
