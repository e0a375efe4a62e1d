/// Approval endpoints
///
/// # Endpoints
///
/// - `GET  /v1/projects/:project_id/approvals` - List approvals, newest first (client+)
/// - `POST /v1/projects/:project_id/approvals` - Request an approval (member+)
/// - `POST /v1/projects/:project_id/approvals/:approval_id/decision` - Approve or reject (manager+)
///
/// # Decision
///
/// ```text
/// POST /v1/projects/proj-spring-launch/approvals/appr-hero-banner/decision
///
/// { "decision": "approve", "comment": "Looks great" }
/// ```
///
/// Only pending approvals can be decided; a second decision is `409 Conflict`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{authorize_project, check_id, success, validate_body, ApiResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use portal_shared::{
    auth::{authorization::Role, middleware::AuthContext},
    models::{
        approval::{Approval, CreateApproval, DecideApproval},
        webhook::WebhookEvent,
    },
};

pub async fn list_approvals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<Approval>>>> {
    let (_, project) = authorize_project(&state, &auth, &project_id, Role::Client).await?;

    let approvals = Approval::list_by_project(&state.store, &project.id).await?;
    Ok(success(approvals))
}

pub async fn create_approval(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateApproval>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Approval>>)> {
    let (user, project) = authorize_project(&state, &auth, &project_id, Role::Member).await?;
    validate_body(&req)?;

    let approval = Approval::create(&state.store, &project.id, &user.id, req).await?;

    tracing::info!(approval_id = %approval.id, project_id = %project.id, "Approval requested");
    state.notify(
        &project.org_id,
        WebhookEvent::ApprovalRequested,
        serde_json::to_value(&approval).unwrap_or_default(),
    );

    Ok((StatusCode::CREATED, success(approval)))
}

pub async fn decide_approval(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, approval_id)): Path<(String, String)>,
    Json(req): Json<DecideApproval>,
) -> ApiResult<Json<ApiResponse<Approval>>> {
    let (user, project) = authorize_project(&state, &auth, &project_id, Role::Manager).await?;
    check_id("approvalId", &approval_id)?;
    validate_body(&req)?;

    let mut approval = Approval::find(&state.store, &project.id, &approval_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Approval not found".to_string()))?;

    if !approval.decide(&user.id, req) {
        return Err(ApiError::Conflict(format!(
            "Approval already {}",
            approval.status.as_str()
        )));
    }

    let approval = Approval::replace(&state.store, &approval).await?;

    tracing::info!(
        approval_id = %approval.id,
        project_id = %project.id,
        status = approval.status.as_str(),
        decided_by = %user.id,
        "Approval decided"
    );
    state.notify(
        &project.org_id,
        WebhookEvent::ApprovalDecided,
        serde_json::to_value(&approval).unwrap_or_default(),
    );

    Ok(success(approval))
}
