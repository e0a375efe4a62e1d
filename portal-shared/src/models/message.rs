/// Message model
///
/// Conversation between agency and client on a project. Messages that
/// reply to one another share a `threadId`; the first message of a thread
/// uses its own id. Partitioned on `/projectId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

/// Maximum message body length (characters)
pub const MAX_BODY_LENGTH: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,

    /// Partition key
    pub project_id: String,

    pub author_id: String,

    pub body: String,

    pub thread_id: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Message {
    const CONTAINER: &'static str = "messages";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    #[validate(length(min = 1, max = MAX_BODY_LENGTH, message = "Message must be 1-5000 characters"))]
    pub body: String,

    /// Thread to reply to; starts a new thread when absent
    #[validate(custom(function = "super::validate_id"))]
    pub thread_id: Option<String>,
}

impl Message {
    pub fn build(project_id: &str, id: &str, author_id: &str, data: CreateMessage) -> Self {
        let now = Utc::now();

        Message {
            id: id.to_string(),
            project_id: project_id.to_string(),
            author_id: author_id.to_string(),
            body: data.body,
            thread_id: data.thread_id.unwrap_or_else(|| id.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn upsert(store: &SharedStore, message: &Message) -> StoreResult<Self> {
        get_container::<Message>(store).upsert(message).await
    }

    /// Lists one thread oldest first
    pub async fn list_thread(store: &SharedStore, project_id: &str, thread_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new(
            "SELECT * FROM c WHERE c.projectId = @projectId AND c.threadId = @threadId ORDER BY c.createdAt ASC",
        )
        .param("@projectId", project_id)
        .param("@threadId", thread_id);
        get_container::<Message>(store).query(&query, Some(project_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_length() {
        let ok = CreateMessage {
            body: "x".repeat(MAX_BODY_LENGTH as usize),
            thread_id: None,
        };
        assert!(ok.validate().is_ok());

        let long = CreateMessage {
            body: "x".repeat(MAX_BODY_LENGTH as usize + 1),
            thread_id: None,
        };
        assert!(long.validate().is_err());

        let empty = CreateMessage {
            body: String::new(),
            thread_id: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_new_message_starts_thread() {
        let msg = Message::build("p-1", "m-1", "u-1", CreateMessage {
            body: "Hello".to_string(),
            thread_id: None,
        });
        assert_eq!(msg.thread_id, "m-1");
    }
}
