//! # Marketing Portal Shared Library
//!
//! Types, storage and business logic shared by the portal API server and
//! the operations CLI.
//!
//! ## Module Organization
//!
//! - `auth`: session tokens, request authentication and role checks
//! - `db`: document store trait, Cosmos DB client, in-memory store, container catalogue
//! - `models`: document types and their queries
//! - `export`: project report rendering (PDF, XLSX)
//! - `workflow`: project workflow buttons (simulated)
//! - `delivery`: signed webhook delivery

pub mod auth;
pub mod db;
pub mod delivery;
pub mod export;
pub mod models;
pub mod workflow;

/// Current version of the portal shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
