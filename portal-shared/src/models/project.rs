/// Project model
///
/// A project is one client engagement run by an organization. Projects are
/// partitioned on `/orgId`; everything hanging off a project (work items,
/// events, assets, insights, messages, approvals) is partitioned on
/// `/projectId` instead.
///
/// # Document
///
/// ```json
/// {
///   "id": "proj-spring-launch",
///   "orgId": "org-acme",
///   "name": "Spring Launch",
///   "clientName": "Acme Outdoor",
///   "status": "active",
///   "budget": 48000.0,
///   "startDate": "2024-03-01",
///   "endDate": "2024-05-31",
///   "createdAt": "2024-02-20T10:00:00Z",
///   "updatedAt": "2024-03-04T16:30:00Z"
/// }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

/// Project lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,

    /// Owning organization (partition key)
    pub org_id: String,

    pub name: String,

    pub client_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: ProjectStatus,

    /// Budget in the organization's currency, never negative
    pub budget: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Project {
    const CONTAINER: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.org_id
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_schedule", skip_on_field_errors = false))]
pub struct CreateProject {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Client name must be 1-200 characters"))]
    pub client_name: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_status")]
    pub status: ProjectStatus,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: f64,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Planning
}

fn validate_schedule(data: &CreateProject) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (data.start_date, data.end_date) {
        if end < start {
            let mut err = ValidationError::new("schedule");
            err.message = Some(Cow::from("End date must not be before start date"));
            return Err(err);
        }
    }
    Ok(())
}

impl Project {
    /// Creates a new project in an organization
    pub async fn create(store: &SharedStore, org_id: &str, data: CreateProject) -> StoreResult<Self> {
        Self::create_with_id(store, org_id, &super::new_id(), data).await
    }

    /// Creates a project with a caller-chosen id
    pub async fn create_with_id(
        store: &SharedStore,
        org_id: &str,
        id: &str,
        data: CreateProject,
    ) -> StoreResult<Self> {
        get_container::<Project>(store)
            .create(&Self::build(org_id, id, data))
            .await
    }

    /// Builds a document without storing it
    pub fn build(org_id: &str, id: &str, data: CreateProject) -> Self {
        let now = Utc::now();

        Project {
            id: id.to_string(),
            org_id: org_id.to_string(),
            name: data.name,
            client_name: data.client_name,
            description: data.description,
            status: data.status,
            budget: data.budget,
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts or overwrites a project
    pub async fn upsert(store: &SharedStore, project: &Project) -> StoreResult<Self> {
        get_container::<Project>(store).upsert(project).await
    }

    /// Point read within an organization
    pub async fn find(store: &SharedStore, org_id: &str, id: &str) -> StoreResult<Option<Self>> {
        get_container::<Project>(store).read(org_id, id).await
    }

    /// Lists an organization's projects, most recently updated first
    pub async fn list_by_org(
        store: &SharedStore,
        org_id: &str,
        status: Option<ProjectStatus>,
    ) -> StoreResult<Vec<Self>> {
        let query = match status {
            Some(status) => Query::new(
                "SELECT * FROM c WHERE c.orgId = @orgId AND c.status = @status ORDER BY c.updatedAt DESC",
            )
            .param("@orgId", org_id)
            .param("@status", status.as_str()),
            None => Query::new("SELECT * FROM c WHERE c.orgId = @orgId ORDER BY c.updatedAt DESC")
                .param("@orgId", org_id),
        };

        get_container::<Project>(store).query(&query, Some(org_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    async fn store() -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new("test"));
        store.initialize_database().await.unwrap();
        store
    }

    fn input(name: &str, status: ProjectStatus) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            client_name: "Acme".to_string(),
            description: None,
            status,
            budget: 1000.0,
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_organization() {
        let store = store().await;
        let project = Project::create_with_id(&store, "org-1", "p-1", input("Launch", ProjectStatus::Active))
            .await
            .unwrap();

        assert_eq!(Project::find(&store, "org-1", "p-1").await.unwrap().unwrap(), project);
        assert!(Project::find(&store, "org-2", "p-1").await.unwrap().is_none());

        let twin = Project::build("org-2", "p-1", input("Twin", ProjectStatus::Planning));
        Project::upsert(&store, &twin).await.unwrap();
        assert_eq!(Project::find(&store, "org-1", "p-1").await.unwrap().unwrap().name, "Launch");
        assert_eq!(Project::find(&store, "org-2", "p-1").await.unwrap().unwrap().name, "Twin");
    }

    #[tokio::test]
    async fn test_list_by_org_filters_status() {
        let store = store().await;
        Project::create(&store, "org-1", input("A", ProjectStatus::Active)).await.unwrap();
        Project::create(&store, "org-1", input("B", ProjectStatus::Planning)).await.unwrap();
        Project::create(&store, "org-2", input("C", ProjectStatus::Active)).await.unwrap();

        assert_eq!(Project::list_by_org(&store, "org-1", None).await.unwrap().len(), 2);

        let active = Project::list_by_org(&store, "org-1", Some(ProjectStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "A");
    }

    #[test]
    fn test_validation() {
        assert!(input("A", ProjectStatus::Active).validate().is_ok());

        let mut negative = input("A", ProjectStatus::Active);
        negative.budget = -1.0;
        assert!(negative.validate().is_err());

        let mut backwards = input("A", ProjectStatus::Active);
        backwards.start_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        backwards.end_date = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(backwards.validate().is_err());

        let mut unnamed = input("", ProjectStatus::Active);
        unnamed.client_name = String::new();
        let errors = unnamed.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(ProjectStatus::OnHold).unwrap(), "on_hold");
        assert_eq!(ProjectStatus::OnHold.as_str(), "on_hold");
    }
}
