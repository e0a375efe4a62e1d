/// Document models for the portal
///
/// Every model is a JSON document in its own Cosmos DB container, with
/// camelCase fields, an `id`, `createdAt` / `updatedAt` timestamps and a
/// partition key field (`orgId` or `projectId`).
///
/// # Models
///
/// - `organization`: tenants (partitioned on their own id)
/// - `user`: accounts and their role grants
/// - `project`: client engagements inside an organization
/// - `work_item`: tasks on a project board
/// - `event`: calendar entries (meetings, launches, deadlines)
/// - `asset`: creative files moving through review
/// - `insight`: reported metrics
/// - `message`: project conversation threads
/// - `approval`: sign-off requests
/// - `tool`: the organization's marketing tool inventory
/// - `webhook`: HTTP callbacks for portal events
///
/// Input structs (`Create*`) derive `validator::Validate`; call
/// `validate()` at the API boundary before handing them to a model.
///
/// # Example
///
/// ```no_run
/// use portal_shared::db::{MemoryStore, SharedStore};
/// use portal_shared::models::project::{CreateProject, Project, ProjectStatus};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SharedStore = Arc::new(MemoryStore::new("portal"));
/// store.initialize_database().await?;
///
/// let project = Project::create(&store, "org-acme", CreateProject {
///     name: "Spring Launch".to_string(),
///     client_name: "Acme Outdoor".to_string(),
///     description: None,
///     status: ProjectStatus::Planning,
///     budget: 25_000.0,
///     start_date: None,
///     end_date: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use std::borrow::Cow;
use validator::ValidationError;

pub mod approval;
pub mod asset;
pub mod event;
pub mod insight;
pub mod message;
pub mod organization;
pub mod project;
pub mod tool;
pub mod user;
pub mod webhook;
pub mod work_item;

/// Maximum length of a document id
pub const MAX_ID_LENGTH: usize = 128;

/// Generates a new document id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validates a document id: 1 to 128 characters of `[A-Za-z0-9_-]`
///
/// Usable directly or as a `#[validate(custom(function = "validate_id"))]`
/// target.
///
/// # Example
///
/// ```
/// use portal_shared::models::validate_id;
///
/// assert!(validate_id("proj-spring-launch").is_ok());
/// assert!(validate_id("../etc/passwd").is_err());
/// assert!(validate_id("").is_err());
/// ```
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        let mut err = ValidationError::new("id_length");
        err.message = Some(Cow::from(format!(
            "Id must be 1-{} characters",
            MAX_ID_LENGTH
        )));
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("id_format");
        err.message = Some(Cow::from(
            "Id may only contain letters, digits, '-' and '_'",
        ));
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_valid() {
        let id = new_id();
        assert!(validate_id(&id).is_ok());
        assert_ne!(id, new_id());
    }

    #[test]
    fn test_validate_id_bounds() {
        assert!(validate_id("a").is_ok());
        assert!(validate_id(&"a".repeat(MAX_ID_LENGTH)).is_ok());
        assert!(validate_id(&"a".repeat(MAX_ID_LENGTH + 1)).is_err());
        assert!(validate_id("").is_err());
    }

    #[test]
    fn test_validate_id_charset() {
        assert!(validate_id("Proj_01-a").is_ok());
        assert!(validate_id("proj 1").is_err());
        assert!(validate_id("proj/1").is_err());
        assert!(validate_id("proj.1").is_err());
        assert_eq!(
            validate_id("a/b").unwrap_err().code,
            "id_format"
        );
    }
}
