/// Organization model
///
/// Organizations are the tenants of the portal. The `organizations`
/// container is partitioned on `/orgId`, and an organization's `orgId` is
/// its own `id`, so every organization sits alone in its partition.
///
/// # Document
///
/// ```json
/// {
///   "id": "org-acme",
///   "orgId": "org-acme",
///   "name": "Acme Outdoor",
///   "slug": "acme-outdoor",
///   "plan": "growth",
///   "createdAt": "2024-03-01T09:00:00Z",
///   "updatedAt": "2024-03-01T09:00:00Z"
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, SharedStore, StoreResult};

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Starter,
    Growth,
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,

    /// Partition key, always equal to `id`
    pub org_id: String,

    pub name: String,

    /// URL-safe short name
    pub slug: String,

    pub plan: Plan,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Organization {
    const CONTAINER: &'static str = "organizations";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.org_id
    }
}

/// Input for creating an organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    /// Explicit id; generated when absent
    #[validate(custom(function = "super::validate_id"))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(custom(function = "super::validate_id"))]
    pub slug: String,

    pub plan: Plan,
}

impl Organization {
    /// Creates a new organization
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` when the id is already taken
    pub async fn create(store: &SharedStore, data: CreateOrganization) -> StoreResult<Self> {
        let now = Utc::now();
        let id = data.id.unwrap_or_else(super::new_id);

        let org = Organization {
            org_id: id.clone(),
            id,
            name: data.name,
            slug: data.slug,
            plan: data.plan,
            created_at: now,
            updated_at: now,
        };

        get_container::<Organization>(store).create(&org).await
    }

    /// Inserts or overwrites an organization
    pub async fn upsert(store: &SharedStore, org: &Organization) -> StoreResult<Self> {
        get_container::<Organization>(store).upsert(org).await
    }

    /// Finds an organization by id (point read)
    pub async fn find_by_id(store: &SharedStore, id: &str) -> StoreResult<Option<Self>> {
        get_container::<Organization>(store).read(id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreError};
    use std::sync::Arc;

    async fn store() -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new("test"));
        store.initialize_database().await.unwrap();
        store
    }

    fn input(id: Option<&str>) -> CreateOrganization {
        CreateOrganization {
            id: id.map(str::to_string),
            name: "Acme Outdoor".to_string(),
            slug: "acme-outdoor".to_string(),
            plan: Plan::Growth,
        }
    }

    #[tokio::test]
    async fn test_create_partitions_on_own_id() {
        let store = store().await;
        let org = Organization::create(&store, input(Some("org-acme"))).await.unwrap();

        assert_eq!(org.org_id, "org-acme");
        let found = Organization::find_by_id(&store, "org-acme").await.unwrap().unwrap();
        assert_eq!(found.name, "Acme Outdoor");
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let store = store().await;
        Organization::create(&store, input(Some("org-acme"))).await.unwrap();

        let err = Organization::create(&store, input(Some("org-acme"))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_validation() {
        assert!(input(None).validate().is_ok());

        let mut bad = input(Some("has space"));
        bad.name = String::new();
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_plan_wire_format() {
        assert_eq!(serde_json::to_value(Plan::Enterprise).unwrap(), "enterprise");
        assert!(serde_json::from_str::<Plan>("\"platinum\"").is_err());
    }
}
