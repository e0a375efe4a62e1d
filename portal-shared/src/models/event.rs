/// Calendar event model
///
/// Meetings, launches, deadlines and reviews shown on a project's
/// calendar. Partitioned on `/projectId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Meeting,
    Launch,
    Deadline,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,

    /// Partition key
    pub project_id: String,

    pub title: String,

    pub kind: EventKind,

    pub starts_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Event {
    const CONTAINER: &'static str = "events";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_window"))]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,

    pub kind: EventKind,

    pub starts_at: DateTime<Utc>,

    pub ends_at: Option<DateTime<Utc>>,
}

fn validate_window(data: &CreateEvent) -> Result<(), ValidationError> {
    match data.ends_at {
        Some(end) if end < data.starts_at => {
            let mut err = ValidationError::new("window");
            err.message = Some(Cow::from("Event cannot end before it starts"));
            Err(err)
        }
        _ => Ok(()),
    }
}

impl Event {
    pub fn build(project_id: &str, id: &str, data: CreateEvent) -> Self {
        let now = Utc::now();

        Event {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: data.title,
            kind: data.kind,
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn upsert(store: &SharedStore, event: &Event) -> StoreResult<Self> {
        get_container::<Event>(store).upsert(event).await
    }

    /// Lists a project's events in start order
    pub async fn list_by_project(store: &SharedStore, project_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.projectId = @projectId ORDER BY c.startsAt ASC")
            .param("@projectId", project_id);
        get_container::<Event>(store).query(&query, Some(project_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window_validation() {
        let start = Utc::now();
        let mut data = CreateEvent {
            title: "Kickoff".to_string(),
            kind: EventKind::Meeting,
            starts_at: start,
            ends_at: Some(start + Duration::hours(1)),
        };
        assert!(data.validate().is_ok());

        data.ends_at = Some(start - Duration::hours(1));
        assert!(data.validate().is_err());
    }
}
