//! # Marketing Portal Operations
//!
//! Maintenance tasks run against the portal's Cosmos DB database.
//!
//! ## Modules
//!
//! - `init`: create the database and missing containers
//! - `indexes`: apply the catalogued composite indexes
//! - `seed`: write the demo organization and its projects
//!
//! All tasks take a [`portal_shared::db::SharedStore`], so they run the
//! same against Cosmos DB and the in-memory store.

pub mod indexes;
pub mod init;
pub mod seed;
