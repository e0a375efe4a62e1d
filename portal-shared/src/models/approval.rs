/// Approval model
///
/// A sign-off request on something inside a project (an asset, a campaign,
/// a report). Approvals start `pending` and are decided exactly once.
/// Partitioned on `/projectId`.
///
/// # Document
///
/// ```json
/// {
///   "id": "appr-hero-banner",
///   "projectId": "proj-spring-launch",
///   "subjectType": "asset",
///   "subjectId": "asset-hero-banner",
///   "requestedBy": "user-dana",
///   "status": "approved",
///   "decidedBy": "user-chris",
///   "decidedAt": "2024-03-05T11:00:00Z",
///   "comment": "Looks great",
///   "createdAt": "2024-03-04T17:00:00Z",
///   "updatedAt": "2024-03-05T11:00:00Z"
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// Outcome chosen by the approver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: String,

    /// Partition key
    pub project_id: String,

    /// What is being approved, e.g. `asset`
    pub subject_type: String,

    pub subject_id: String,

    pub requested_by: String,

    pub status: ApprovalStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Approval {
    const CONTAINER: &'static str = "approvals";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

/// Input for requesting an approval
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApproval {
    #[validate(length(min = 1, max = 64, message = "Subject type must be 1-64 characters"))]
    pub subject_type: String,

    #[validate(custom(function = "super::validate_id"))]
    pub subject_id: String,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Input for deciding an approval
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecideApproval {
    pub decision: Decision,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

impl Approval {
    pub fn build(project_id: &str, id: &str, requested_by: &str, data: CreateApproval) -> Self {
        let now = Utc::now();

        Approval {
            id: id.to_string(),
            project_id: project_id.to_string(),
            subject_type: data.subject_type,
            subject_id: data.subject_id,
            requested_by: requested_by.to_string(),
            status: ApprovalStatus::Pending,
            decided_by: None,
            decided_at: None,
            comment: data.comment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Requests a new approval
    pub async fn create(
        store: &SharedStore,
        project_id: &str,
        requested_by: &str,
        data: CreateApproval,
    ) -> StoreResult<Self> {
        let approval = Self::build(project_id, &super::new_id(), requested_by, data);
        get_container::<Approval>(store).create(&approval).await
    }

    pub async fn upsert(store: &SharedStore, approval: &Approval) -> StoreResult<Self> {
        get_container::<Approval>(store).upsert(approval).await
    }

    pub async fn find(store: &SharedStore, project_id: &str, id: &str) -> StoreResult<Option<Self>> {
        get_container::<Approval>(store).read(project_id, id).await
    }

    /// Lists a project's approvals, newest first
    pub async fn list_by_project(store: &SharedStore, project_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.projectId = @projectId ORDER BY c.createdAt DESC")
            .param("@projectId", project_id);
        get_container::<Approval>(store).query(&query, Some(project_id)).await
    }

    /// Records a decision; returns false when the approval was not pending
    pub fn decide(&mut self, decided_by: &str, data: DecideApproval) -> bool {
        if self.status != ApprovalStatus::Pending {
            return false;
        }

        let now = Utc::now();
        self.status = match data.decision {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        };
        self.decided_by = Some(decided_by.to_string());
        self.decided_at = Some(now);
        if data.comment.is_some() {
            self.comment = data.comment;
        }
        self.updated_at = now;
        true
    }

    /// Persists a decided approval
    pub async fn replace(store: &SharedStore, approval: &Approval) -> StoreResult<Self> {
        get_container::<Approval>(store).replace(approval).await
    }
}
