/// Work item endpoints
///
/// # Endpoints
///
/// - `GET  /v1/projects/:project_id/work-items` - List work items, highest priority first (client+)
/// - `POST /v1/projects/:project_id/work-items` - Create work item (member+)

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{authorize_project, success, validate_body, ApiResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use portal_shared::{
    auth::{authorization::Role, middleware::AuthContext},
    models::work_item::{CreateWorkItem, WorkItem},
};

pub async fn list_work_items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<WorkItem>>>> {
    let (_, project) = authorize_project(&state, &auth, &project_id, Role::Client).await?;

    let items = WorkItem::list_by_project(&state.store, &project.id).await?;
    Ok(success(items))
}

pub async fn create_work_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateWorkItem>,
) -> ApiResult<(StatusCode, Json<ApiResponse<WorkItem>>)> {
    let (_, project) = authorize_project(&state, &auth, &project_id, Role::Member).await?;
    validate_body(&req)?;

    let item = WorkItem::create(&state.store, &project.id, req).await?;
    tracing::debug!(work_item_id = %item.id, project_id = %project.id, "Work item created");

    Ok((StatusCode::CREATED, success(item)))
}
