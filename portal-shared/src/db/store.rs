/// Document store abstraction
///
/// Every persistence call in the portal goes through the [`DocumentStore`]
/// trait. Two implementations exist:
///
/// - [`CosmosStore`](super::cosmos::CosmosStore): Azure Cosmos DB over its REST API
/// - [`MemoryStore`](super::memory::MemoryStore): in-process store for tests and local runs
///
/// Documents cross the trait boundary as `serde_json::Value`. Typed access
/// goes through [`Container`], which (de)serializes models implementing
/// [`Document`].
///
/// # Example
///
/// ```no_run
/// use portal_shared::db::{get_container, MemoryStore, SharedStore};
/// use portal_shared::models::project::Project;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SharedStore = Arc::new(MemoryStore::new("portal"));
/// store.initialize_database().await?;
///
/// let projects = get_container::<Project>(&store);
/// let found = projects.read("org-acme", "proj-spring-launch").await?;
/// assert!(found.is_none());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::catalog::{self, ContainerDefinition, HEALTH_CHECK_CONTAINER};
use super::query::Query;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to a document store
pub type SharedStore = Arc<dyn DocumentStore>;

/// Error type for document store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Document or container does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A document with the same id already exists in the partition
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Query text could not be parsed or executed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Request was rejected by the service (bad key, throttled, ...)
    #[error("Store request failed with status {status}: {message}")]
    Service { status: u16, message: String },

    /// Network or transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store was configured incorrectly
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Outcome of making sure a container exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Container was created by this call
    Created,

    /// Container was already present
    Existing,
}

/// Document store operations
///
/// Partition key values are passed as plain strings: every container in
/// the portal is partitioned on a single string field (`orgId` or
/// `projectId`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store talks to
    fn database_id(&self) -> &str;

    /// Creates the database if it does not exist yet
    async fn ensure_database(&self) -> StoreResult<()>;

    /// Reads a container definition, `None` when it does not exist
    async fn read_container(&self, name: &str) -> StoreResult<Option<ContainerDefinition>>;

    /// Creates a container
    async fn create_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition>;

    /// Replaces a container definition (used to swap its indexing policy)
    async fn replace_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition>;

    /// Inserts a new document; fails with `Conflict` when the id is taken
    async fn create_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value>;

    /// Inserts or overwrites a document
    async fn upsert_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value>;

    /// Point read by id and partition key
    async fn read_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Replaces an existing document; fails with `NotFound` when absent
    async fn replace_document(
        &self,
        container: &str,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> StoreResult<Value>;

    /// Deletes a document, returning whether it existed
    async fn delete_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<bool>;

    /// Runs a query, scoped to one partition when `partition_key` is given
    async fn query_documents(
        &self,
        container: &str,
        query: &Query,
        partition_key: Option<&str>,
    ) -> StoreResult<Vec<Value>>;

    /// Runs `SELECT TOP 1` against the organizations container
    async fn health_check(&self) -> StoreResult<()> {
        let query = Query::new("SELECT TOP 1 * FROM c");
        self.query_documents(HEALTH_CHECK_CONTAINER, &query, None).await?;
        Ok(())
    }

    /// Creates the database and every catalogued container
    ///
    /// Idempotent: existing containers are left untouched, including
    /// their indexing policy.
    async fn initialize_database(&self) -> StoreResult<Vec<(String, ContainerStatus)>> {
        self.ensure_database().await?;

        let mut report = Vec::new();
        for definition in catalog::containers() {
            let status = match self.read_container(&definition.id).await? {
                Some(_) => ContainerStatus::Existing,
                None => {
                    self.create_container(&definition).await?;
                    tracing::info!(container = %definition.id, "Created container");
                    ContainerStatus::Created
                }
            };
            report.push((definition.id.clone(), status));
        }

        Ok(report)
    }
}

/// A model persisted as a document
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Container the model lives in
    const CONTAINER: &'static str;

    /// Document id
    fn id(&self) -> &str;

    /// Partition key value
    fn partition_key(&self) -> &str;
}

/// Typed handle over one container
pub struct Container<T> {
    store: SharedStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Container<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

/// Opens the typed container handle for a model
pub fn get_container<T: Document>(store: &SharedStore) -> Container<T> {
    Container {
        store: store.clone(),
        _marker: PhantomData,
    }
}

impl<T: Document> Container<T> {
    /// Container name
    pub fn name(&self) -> &'static str {
        T::CONTAINER
    }

    /// Inserts a new document
    pub async fn create(&self, item: &T) -> StoreResult<T> {
        let value = serde_json::to_value(item)?;
        let stored = self
            .store
            .create_document(T::CONTAINER, item.partition_key(), value)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Inserts or overwrites a document
    pub async fn upsert(&self, item: &T) -> StoreResult<T> {
        let value = serde_json::to_value(item)?;
        let stored = self
            .store
            .upsert_document(T::CONTAINER, item.partition_key(), value)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Point read
    pub async fn read(&self, partition_key: &str, id: &str) -> StoreResult<Option<T>> {
        match self.store.read_document(T::CONTAINER, partition_key, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Replaces an existing document
    pub async fn replace(&self, item: &T) -> StoreResult<T> {
        let value = serde_json::to_value(item)?;
        let stored = self
            .store
            .replace_document(T::CONTAINER, item.partition_key(), item.id(), value)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Deletes a document
    pub async fn delete(&self, partition_key: &str, id: &str) -> StoreResult<bool> {
        self.store.delete_document(T::CONTAINER, partition_key, id).await
    }

    /// Runs a query and deserializes every row
    pub async fn query(&self, query: &Query, partition_key: Option<&str>) -> StoreResult<Vec<T>> {
        self.store
            .query_documents(T::CONTAINER, query, partition_key)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .collect()
    }

    /// Finds a document by id across all partitions
    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<T>> {
        let query = Query::new("SELECT TOP 1 * FROM c WHERE c.id = @id").param("@id", id);
        Ok(self.query(&query, None).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("projects/p1".to_string());
        assert_eq!(err.to_string(), "Not found: projects/p1");

        let err = StoreError::Service {
            status: 429,
            message: "throttled".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }
}
