/// Workflow button endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/projects/:project_id/workflows/:action
/// Content-Type: application/json
///
/// { "simulateFailure": false }
/// ```
///
/// `action` is one of `generate-report`, `sync-tools`, `request-approval`,
/// `publish-campaign`, `send-digest`. The body is optional.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "action": "sync-tools",
///     "projectId": "proj-spring-launch",
///     "status": "completed",
///     "message": "Tool inventory synchronized",
///     "simulated": true,
///     "startedAt": "...",
///     "completedAt": "...",
///     "output": { "toolsChecked": 6, "toolsUpdated": 2, "source": "simulated" }
///   }
/// }
/// ```
///
/// A simulated failure still answers `200` with `status: "failed"`.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown action, or a body that is not a JSON object
/// - `403 Forbidden`: Caller is not at least a member on the project

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{authorize_project, success, ApiResponse},
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use portal_shared::{
    auth::{authorization::Role, middleware::AuthContext},
    models::webhook::WebhookEvent,
    workflow::{WorkflowAction, WorkflowOutcome, WorkflowRequest},
};
use serde_json::Value;

pub async fn run_workflow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, action)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<WorkflowOutcome>>> {
    let action: WorkflowAction = action.parse()?;
    let (user, project) = authorize_project(&state, &auth, &project_id, Role::Member).await?;

    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid("payload", format!("Invalid JSON: {}", e)))?
    };

    let request = WorkflowRequest::new(action, &project.id, &user.id).with_payload(payload);
    let outcome = state.runner.run(request).await?;

    tracing::info!(
        runner = state.runner.name(),
        action = %action,
        project_id = %project.id,
        success = outcome.is_success(),
        "Workflow finished"
    );
    state.notify(
        &project.org_id,
        WebhookEvent::WorkflowCompleted,
        serde_json::to_value(&outcome).unwrap_or_default(),
    );

    Ok(success(outcome))
}
