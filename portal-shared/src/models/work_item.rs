/// Work item model
///
/// Tasks on a project board, partitioned on `/projectId`.
///
/// Priority runs from 1 (lowest) to 5 (highest).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

/// Board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Todo => "todo",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::Review => "review",
            WorkItemStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,

    /// Partition key
    pub project_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: WorkItemStatus,

    /// 1..=5
    pub priority: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for WorkItem {
    const CONTAINER: &'static str = "workItems";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

/// Input for creating a work item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkItem {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_status")]
    pub status: WorkItemStatus,

    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 5, message = "Priority must be between 1 and 5"))]
    pub priority: u8,

    #[validate(custom(function = "super::validate_id"))]
    pub assignee_id: Option<String>,

    pub due_date: Option<NaiveDate>,
}

fn default_status() -> WorkItemStatus {
    WorkItemStatus::Todo
}

fn default_priority() -> u8 {
    3
}

impl WorkItem {
    /// Builds a document without storing it
    pub fn build(project_id: &str, id: &str, data: CreateWorkItem) -> Self {
        let now = Utc::now();

        WorkItem {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            assignee_id: data.assignee_id,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a work item on a project
    pub async fn create(store: &SharedStore, project_id: &str, data: CreateWorkItem) -> StoreResult<Self> {
        let item = Self::build(project_id, &super::new_id(), data);
        get_container::<WorkItem>(store).create(&item).await
    }

    /// Inserts or overwrites a work item
    pub async fn upsert(store: &SharedStore, item: &WorkItem) -> StoreResult<Self> {
        get_container::<WorkItem>(store).upsert(item).await
    }

    /// Lists a project's work items, highest priority first
    pub async fn list_by_project(store: &SharedStore, project_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.projectId = @projectId ORDER BY c.priority DESC")
            .param("@projectId", project_id);
        get_container::<WorkItem>(store).query(&query, Some(project_id)).await
    }
}
