/// Project workflow buttons
///
/// The portal exposes a handful of one-click workflows on each project
/// ("Generate report", "Sync tools", ...). A [`WorkflowRunner`] executes a
/// [`WorkflowRequest`] and returns a [`WorkflowOutcome`]. The only runner
/// today is [`SimulatedRunner`], which answers with canned results and
/// touches no external system.
///
/// # Actions
///
/// | Action | Path segment |
/// |--------|--------------|
/// | Generate report | `generate-report` |
/// | Sync tools | `sync-tools` |
/// | Request approval | `request-approval` |
/// | Publish campaign | `publish-campaign` |
/// | Send digest | `send-digest` |

pub mod runner;
pub mod simulated;

pub use runner::{SharedRunner, WorkflowRunner};
pub use simulated::SimulatedRunner;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Unknown workflow action: {0}")]
    UnknownAction(String),

    #[error("Invalid workflow payload: {0}")]
    InvalidPayload(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Closed set of workflow actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowAction {
    GenerateReport,
    SyncTools,
    RequestApproval,
    PublishCampaign,
    SendDigest,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 5] = [
        WorkflowAction::GenerateReport,
        WorkflowAction::SyncTools,
        WorkflowAction::RequestApproval,
        WorkflowAction::PublishCampaign,
        WorkflowAction::SendDigest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::GenerateReport => "generate-report",
            WorkflowAction::SyncTools => "sync-tools",
            WorkflowAction::RequestApproval => "request-approval",
            WorkflowAction::PublishCampaign => "publish-campaign",
            WorkflowAction::SendDigest => "send-digest",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| WorkflowError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// One workflow invocation
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub action: WorkflowAction,
    pub project_id: String,

    /// User who pressed the button
    pub requested_by: String,

    /// Optional JSON object from the request body (`Null` when absent)
    pub payload: Value,
}

impl WorkflowRequest {
    pub fn new(action: WorkflowAction, project_id: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self {
            action,
            project_id: project_id.into(),
            requested_by: requested_by.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub action: WorkflowAction,
    pub project_id: String,
    pub status: WorkflowStatus,
    pub message: String,

    /// True when no real backend was involved
    pub simulated: bool,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Action-specific result data
    pub output: Value,
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        for action in WorkflowAction::ALL {
            assert_eq!(action.as_str().parse::<WorkflowAction>().unwrap(), action);
        }
        assert_eq!(
            "launch-rocket".parse::<WorkflowAction>(),
            Err(WorkflowError::UnknownAction("launch-rocket".to_string()))
        );
        assert!("Generate-Report".parse::<WorkflowAction>().is_err());
    }

    #[test]
    fn test_action_serde_matches_path() {
        let json = serde_json::to_string(&WorkflowAction::PublishCampaign).unwrap();
        assert_eq!(json, "\"publish-campaign\"");
    }
}
