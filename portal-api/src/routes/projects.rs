/// Project endpoints
///
/// # Endpoints
///
/// - `GET  /v1/orgs/:org_id/projects?status=active` - List projects (client+ on org)
/// - `POST /v1/orgs/:org_id/projects` - Create project (manager+ on org)
/// - `GET  /v1/orgs/:org_id/projects/:project_id` - Get project (client+ on project)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{authorize_org, authorize_project, check_id, success, validate_body, ApiResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use portal_shared::{
    auth::{authorization::Role, middleware::AuthContext},
    models::{
        project::{CreateProject, Project, ProjectStatus},
        webhook::WebhookEvent,
    },
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub status: Option<ProjectStatus>,
}

/// List an organization's projects, most recently updated first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Project>>>> {
    authorize_org(&state, &auth, &org_id, Role::Client).await?;

    let projects = Project::list_by_org(&state.store, &org_id, query.status).await?;
    Ok(success(projects))
}

/// Create a project
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed (e.g. negative budget, end before start)
/// - `403 Forbidden`: Caller is not a manager of the organization
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(req): Json<CreateProject>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Project>>)> {
    let user = authorize_org(&state, &auth, &org_id, Role::Manager).await?;
    validate_body(&req)?;

    let project = Project::create(&state.store, &org_id, req).await?;

    tracing::info!(project_id = %project.id, org_id = %org_id, created_by = %user.id, "Project created");
    state.notify(&org_id, WebhookEvent::ProjectCreated, serde_json::to_value(&project).unwrap_or_default());

    Ok((StatusCode::CREATED, success(project)))
}

/// Get one project
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, project_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    check_id("orgId", &org_id)?;
    if auth.org_id != org_id {
        return Err(ApiError::Forbidden("No access to this organization".to_string()));
    }

    let (_, project) = authorize_project(&state, &auth, &project_id, Role::Client).await?;
    Ok(success(project))
}
