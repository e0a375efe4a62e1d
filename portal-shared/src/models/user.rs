/// User model
///
/// Users live in the `users` container, partitioned on the organization
/// they belong to. Sign-in happens in the front end (NextAuth); the backend
/// stores profile data and role grants only, no credentials.
///
/// # Document
///
/// ```json
/// {
///   "id": "user-dana",
///   "orgId": "org-acme",
///   "email": "dana@acme.test",
///   "name": "Dana Whitfield",
///   "roles": [
///     { "scope": "org", "scopeId": "org-acme", "role": "manager" },
///     { "scope": "project", "scopeId": "proj-spring-launch", "role": "admin" }
///   ],
///   "createdAt": "2024-03-01T09:00:00Z",
///   "updatedAt": "2024-03-01T09:00:00Z"
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::authorization::RoleGrant;
use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Owning organization (partition key)
    pub org_id: String,

    pub email: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Role grants across org and project scopes
    #[serde(default)]
    pub roles: Vec<RoleGrant>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for User {
    const CONTAINER: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.org_id
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(custom(function = "super::validate_id"))]
    pub id: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

impl User {
    /// Creates a new user in an organization
    pub async fn create(store: &SharedStore, org_id: &str, data: CreateUser) -> StoreResult<Self> {
        let now = Utc::now();

        let user = User {
            id: data.id.unwrap_or_else(super::new_id),
            org_id: org_id.to_string(),
            email: data.email.to_lowercase(),
            name: data.name,
            avatar_url: data.avatar_url,
            roles: data.roles,
            created_at: now,
            updated_at: now,
        };

        get_container::<User>(store).create(&user).await
    }

    /// Inserts or overwrites a user
    pub async fn upsert(store: &SharedStore, user: &User) -> StoreResult<Self> {
        get_container::<User>(store).upsert(user).await
    }

    /// Point read within an organization
    pub async fn find(store: &SharedStore, org_id: &str, id: &str) -> StoreResult<Option<Self>> {
        get_container::<User>(store).read(org_id, id).await
    }

    /// Finds a user by email (case-insensitive) within an organization
    pub async fn find_by_email(store: &SharedStore, org_id: &str, email: &str) -> StoreResult<Option<Self>> {
        let query = Query::new("SELECT TOP 1 * FROM c WHERE c.orgId = @orgId AND c.email = @email")
            .param("@orgId", org_id)
            .param("@email", email.to_lowercase());

        Ok(get_container::<User>(store)
            .query(&query, Some(org_id))
            .await?
            .into_iter()
            .next())
    }

    /// Lists an organization's users by name
    pub async fn list_by_org(store: &SharedStore, org_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.orgId = @orgId ORDER BY c.name ASC").param("@orgId", org_id);
        get_container::<User>(store).query(&query, Some(org_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::Role;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    async fn store() -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new("test"));
        store.initialize_database().await.unwrap();
        store
    }

    fn input(id: &str, email: &str, name: &str) -> CreateUser {
        CreateUser {
            id: Some(id.to_string()),
            email: email.to_string(),
            name: name.to_string(),
            avatar_url: None,
            roles: vec![RoleGrant::org("org-1", Role::Member)],
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store().await;
        let user = User::create(&store, "org-1", input("u-1", "Dana@Acme.test", "Dana"))
            .await
            .unwrap();

        assert_eq!(user.email, "dana@acme.test");
        assert_eq!(user.roles.len(), 1);

        let found = User::find(&store, "org-1", "u-1").await.unwrap().unwrap();
        assert_eq!(found, user);

        assert!(User::find(&store, "org-2", "u-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_and_list() {
        let store = store().await;
        User::create(&store, "org-1", input("u-2", "zed@acme.test", "Zed")).await.unwrap();
        User::create(&store, "org-1", input("u-1", "amy@acme.test", "Amy")).await.unwrap();
        User::create(&store, "org-2", input("u-3", "amy@other.test", "Amy")).await.unwrap();

        let amy = User::find_by_email(&store, "org-1", "AMY@acme.test").await.unwrap().unwrap();
        assert_eq!(amy.id, "u-1");

        let names: Vec<String> = User::list_by_org(&store, "org-1")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }

    #[test]
    fn test_validation() {
        assert!(input("u-1", "a@b.test", "A").validate().is_ok());
        assert!(input("u-1", "not-an-email", "A").validate().is_err());
        assert!(input("u 1", "a@b.test", "A").validate().is_err());
    }
}
