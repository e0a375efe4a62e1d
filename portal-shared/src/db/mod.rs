/// Data access layer
///
/// All documents live in Azure Cosmos DB. Handlers and scripts talk to a
/// [`DocumentStore`] so the same code runs against the in-memory store in
/// tests.
///
/// # Modules
///
/// - `store`: the `DocumentStore` trait, typed `Container` handles, errors
/// - `cosmos`: Cosmos DB REST client (master-key auth)
/// - `memory`: in-memory store with Cosmos-like semantics
/// - `query`: parameterized SQL and the subset evaluated in memory
/// - `catalog`: container definitions and composite indexes
///
/// # Example
///
/// ```no_run
/// use portal_shared::db::{cosmos::CosmosConfig, CosmosStore, DocumentStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = CosmosStore::new(CosmosConfig {
///         endpoint: std::env::var("COSMOS_DB_ENDPOINT")?,
///         key: std::env::var("COSMOS_DB_KEY")?,
///         database_id: "marketing-portal".to_string(),
///         timeout_seconds: 30,
///     })?;
///
///     store.initialize_database().await?;
///     Ok(())
/// }
/// ```

pub mod catalog;
pub mod cosmos;
pub mod memory;
pub mod query;
pub mod store;

pub use cosmos::CosmosStore;
pub use memory::MemoryStore;
pub use query::Query;
pub use store::{
    get_container, Container, ContainerStatus, Document, DocumentStore, SharedStore, StoreError,
    StoreResult,
};
