/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `session`: Session token validation
/// - `projects`: Organization projects
/// - `work_items`: Project work items
/// - `approvals`: Project approvals and decisions
/// - `exports`: Project report downloads (PDF, XLSX)
/// - `workflows`: Project workflow buttons
/// - `webhooks`: Organization webhook management
///
/// Shared helpers for loading the caller and checking access live here.

pub mod approvals;
pub mod exports;
pub mod health;
pub mod projects;
pub mod session;
pub mod webhooks;
pub mod work_items;
pub mod workflows;

use axum::Json;
use portal_shared::{
    auth::{
        authorization::{require_org_role, require_project_role, Role},
        middleware::AuthContext,
    },
    models::{project::Project, user::User, validate_id},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Success envelope: `{ "success": true, "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wraps `data` in the success envelope
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

/// Validates a path id, reporting failures against `field`
pub fn check_id(field: &str, id: &str) -> ApiResult<()> {
    validate_id(id).map_err(|e| {
        ApiError::invalid(
            field,
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid id".to_string()),
        )
    })
}

/// Validates a request body
pub fn validate_body<T: Validate>(body: &T) -> ApiResult<()> {
    body.validate().map_err(ApiError::from)
}

/// Loads the calling user's document
///
/// A valid session whose user document is gone cannot be authorized.
pub async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find(&state.store, &auth.org_id, &auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("User account not found".to_string()))
}

/// Requires `role` in the organization named by the path
///
/// Sessions are bound to one organization; other organizations are
/// forbidden regardless of grants.
pub async fn authorize_org(state: &AppState, auth: &AuthContext, org_id: &str, role: Role) -> ApiResult<User> {
    check_id("orgId", org_id)?;

    if auth.org_id != org_id {
        return Err(ApiError::Forbidden("No access to this organization".to_string()));
    }

    let user = current_user(state, auth).await?;
    require_org_role(&user.roles, org_id, role)?;
    Ok(user)
}

/// Loads a project within the caller's organization and requires `role`
/// on it (through an org or project grant)
///
/// Projects of other organizations are reported as not found.
pub async fn authorize_project(
    state: &AppState,
    auth: &AuthContext,
    project_id: &str,
    role: Role,
) -> ApiResult<(User, Project)> {
    check_id("projectId", project_id)?;

    let project = Project::find(&state.store, &auth.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let user = current_user(state, auth).await?;
    require_project_role(&user.roles, &project.org_id, &project.id, role)?;

    Ok((user, project))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_id() {
        assert!(check_id("projectId", "proj-1").is_ok());

        match check_id("projectId", "bad id!") {
            Err(ApiError::ValidationError(details)) => {
                assert_eq!(details[0].field, "projectId");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_success_envelope() {
        let Json(body) = success(vec![1, 2]);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "data": [1, 2] }));
    }
}
