/// Project report downloads
///
/// # Endpoints
///
/// - `GET /v1/projects/:project_id/export/pdf`
/// - `GET /v1/projects/:project_id/export/xlsx`
///
/// # Response
///
/// The file bytes, with:
///
/// ```text
/// Content-Type: application/pdf
/// Content-Disposition: attachment; filename="project-<id>-report.pdf"
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Project id is not 1-128 characters of `[A-Za-z0-9_-]`
/// - `403 Forbidden`: Caller holds no role on the project
/// - `404 Not Found`: No such project in the caller's organization
/// - `500 Internal Server Error`: Loading or rendering failed

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_id, current_user},
};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use portal_shared::{
    auth::{
        authorization::{require_project_role, Role},
        middleware::AuthContext,
    },
    export::{ExportFormat, ProjectReport},
    models::{project::Project, webhook::WebhookEvent},
};

pub async fn export_pdf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Response> {
    export(&state, &auth, &project_id, ExportFormat::Pdf).await
}

pub async fn export_xlsx(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Response> {
    export(&state, &auth, &project_id, ExportFormat::Xlsx).await
}

async fn export(state: &AppState, auth: &AuthContext, project_id: &str, format: ExportFormat) -> ApiResult<Response> {
    check_id("projectId", project_id)?;

    let project = Project::find(&state.store, &auth.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let user = current_user(state, auth).await?;
    require_project_role(&user.roles, &project.org_id, &project.id, Role::Client)?;

    let report = ProjectReport::load(&state.store, project).await?;
    let bytes = format.render(&report)?;

    tracing::info!(
        project_id = %project_id,
        format = format.extension(),
        size = bytes.len(),
        "Project report exported"
    );
    state.notify(
        &report.project.org_id,
        WebhookEvent::ExportGenerated,
        serde_json::json!({
            "projectId": report.project.id,
            "format": format,
            "requestedBy": user.id,
        }),
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, format.content_disposition(project_id)),
        ],
        bytes,
    )
        .into_response())
}
