/// In-memory document store
///
/// Keeps containers and documents in process memory behind a tokio
/// `RwLock`. Semantics follow Cosmos DB closely enough for handlers and
/// scripts to behave the same against either backend:
///
/// - `create_document` fails with `Conflict` when the id exists in the partition
/// - `replace_document` fails with `NotFound` when the document is absent
/// - operations on a missing container fail with `NotFound`
/// - queries use the subset understood by [`ParsedQuery`]
///
/// Documents get `_ts` (epoch seconds) stamped on every write, like the
/// service does.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::catalog::ContainerDefinition;
use super::query::{ParsedQuery, Query};
use super::store::{DocumentStore, StoreError, StoreResult};

#[derive(Debug)]
struct ContainerData {
    definition: ContainerDefinition,
    // (partition key, id) -> document
    documents: BTreeMap<(String, String), Value>,
}

#[derive(Debug, Default)]
struct Inner {
    database_created: bool,
    containers: HashMap<String, ContainerData>,
}

/// In-memory [`DocumentStore`]
#[derive(Debug)]
pub struct MemoryStore {
    database_id: String,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of documents in a container (0 when it does not exist)
    pub async fn document_count(&self, container: &str) -> usize {
        let inner = self.inner.read().await;
        inner
            .containers
            .get(container)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }
}

fn container_missing(name: &str) -> StoreError {
    StoreError::NotFound(format!("container '{}'", name))
}

fn document_id(document: &Value) -> StoreResult<String> {
    document
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Service {
            status: 400,
            message: "Document is missing a string 'id'".to_string(),
        })
}

fn stamp(mut document: Value) -> Value {
    if let Value::Object(ref mut map) = document {
        map.insert("_ts".to_string(), Value::from(chrono::Utc::now().timestamp()));
    }
    document
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn database_id(&self) -> &str {
        &self.database_id
    }

    async fn ensure_database(&self) -> StoreResult<()> {
        self.inner.write().await.database_created = true;
        Ok(())
    }

    async fn read_container(&self, name: &str) -> StoreResult<Option<ContainerDefinition>> {
        let inner = self.inner.read().await;
        Ok(inner.containers.get(name).map(|c| c.definition.clone()))
    }

    async fn create_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition> {
        let mut inner = self.inner.write().await;
        if !inner.database_created {
            return Err(StoreError::NotFound(format!("database '{}'", self.database_id)));
        }
        if inner.containers.contains_key(&definition.id) {
            return Err(StoreError::Conflict(format!("container '{}'", definition.id)));
        }

        inner.containers.insert(
            definition.id.clone(),
            ContainerData {
                definition: definition.clone(),
                documents: BTreeMap::new(),
            },
        );

        Ok(definition.clone())
    }

    async fn replace_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition> {
        let mut inner = self.inner.write().await;
        let data = inner
            .containers
            .get_mut(&definition.id)
            .ok_or_else(|| container_missing(&definition.id))?;

        if data.definition.partition_key != definition.partition_key {
            return Err(StoreError::Service {
                status: 400,
                message: "Partition key of a container cannot be changed".to_string(),
            });
        }

        data.definition = definition.clone();
        Ok(definition.clone())
    }

    async fn create_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value> {
        let id = document_id(&document)?;
        let mut inner = self.inner.write().await;
        let data = inner
            .containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;

        let key = (partition_key.to_string(), id);
        if data.documents.contains_key(&key) {
            return Err(StoreError::Conflict(format!("{}/{}", container, key.1)));
        }

        let document = stamp(document);
        data.documents.insert(key, document.clone());
        Ok(document)
    }

    async fn upsert_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value> {
        let id = document_id(&document)?;
        let mut inner = self.inner.write().await;
        let data = inner
            .containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;

        let document = stamp(document);
        data.documents
            .insert((partition_key.to_string(), id), document.clone());
        Ok(document)
    }

    async fn read_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<Option<Value>> {
        let inner = self.inner.read().await;
        let data = inner
            .containers
            .get(container)
            .ok_or_else(|| container_missing(container))?;

        Ok(data
            .documents
            .get(&(partition_key.to_string(), id.to_string()))
            .cloned())
    }

    async fn replace_document(
        &self,
        container: &str,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> StoreResult<Value> {
        let mut inner = self.inner.write().await;
        let data = inner
            .containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;

        let slot = data
            .documents
            .get_mut(&(partition_key.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", container, id)))?;

        let document = stamp(document);
        *slot = document.clone();
        Ok(document)
    }

    async fn delete_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let data = inner
            .containers
            .get_mut(container)
            .ok_or_else(|| container_missing(container))?;

        Ok(data
            .documents
            .remove(&(partition_key.to_string(), id.to_string()))
            .is_some())
    }

    async fn query_documents(
        &self,
        container: &str,
        query: &Query,
        partition_key: Option<&str>,
    ) -> StoreResult<Vec<Value>> {
        let parsed = ParsedQuery::parse(query)?;
        let inner = self.inner.read().await;
        let data = inner
            .containers
            .get(container)
            .ok_or_else(|| container_missing(container))?;

        let rows = data
            .documents
            .iter()
            .filter(|((pk, _), _)| partition_key.map(|wanted| wanted == pk.as_str()).unwrap_or(true))
            .map(|(_, doc)| doc);

        Ok(parsed.apply(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog;
    use crate::db::store::ContainerStatus;
    use serde_json::json;

    async fn initialized() -> MemoryStore {
        let store = MemoryStore::new("test");
        store.initialize_database().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = MemoryStore::new("test");

        let first = store.initialize_database().await.unwrap();
        assert!(first.iter().all(|(_, s)| *s == ContainerStatus::Created));
        assert_eq!(first.len(), catalog::containers().len());

        let second = store.initialize_database().await.unwrap();
        assert!(second.iter().all(|(_, s)| *s == ContainerStatus::Existing));
    }

    #[tokio::test]
    async fn test_health_check_requires_initialization() {
        let store = MemoryStore::new("test");
        assert!(store.health_check().await.is_err());

        store.initialize_database().await.unwrap();
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_conflicts_on_duplicate_id() {
        let store = initialized().await;
        let doc = json!({"id": "p1", "orgId": "o1", "name": "Launch"});

        store.create_document("projects", "o1", doc.clone()).await.unwrap();
        let err = store.create_document("projects", "o1", doc.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Same id in another partition is a different document
        assert!(store.create_document("projects", "o2", doc).await.is_ok());
        assert_eq!(store.document_count("projects").await, 2);
    }

    #[tokio::test]
    async fn test_read_replace_delete() {
        let store = initialized().await;
        store
            .upsert_document("projects", "o1", json!({"id": "p1", "orgId": "o1", "name": "A"}))
            .await
            .unwrap();

        let read = store.read_document("projects", "o1", "p1").await.unwrap().unwrap();
        assert_eq!(read["name"], "A");
        assert!(read["_ts"].is_i64());

        store
            .replace_document("projects", "o1", "p1", json!({"id": "p1", "orgId": "o1", "name": "B"}))
            .await
            .unwrap();
        let read = store.read_document("projects", "o1", "p1").await.unwrap().unwrap();
        assert_eq!(read["name"], "B");

        let missing = store
            .replace_document("projects", "o1", "nope", json!({"id": "nope"}))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));

        assert!(store.delete_document("projects", "o1", "p1").await.unwrap());
        assert!(!store.delete_document("projects", "o1", "p1").await.unwrap());
        assert!(store.read_document("projects", "o1", "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_scoped_to_partition() {
        let store = initialized().await;
        for (pk, id) in [("o1", "a"), ("o1", "b"), ("o2", "c")] {
            store
                .upsert_document("projects", pk, json!({"id": id, "orgId": pk}))
                .await
                .unwrap();
        }

        let all = Query::new("SELECT * FROM c");
        assert_eq!(store.query_documents("projects", &all, None).await.unwrap().len(), 3);
        assert_eq!(store.query_documents("projects", &all, Some("o1")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_container_keeps_partition_key() {
        let store = initialized().await;
        let mut def = catalog::container("projects").unwrap();
        def.partition_key.paths = vec!["/projectId".to_string()];

        assert!(store.replace_container(&def).await.is_err());
    }
}
