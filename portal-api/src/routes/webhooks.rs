/// Webhook management endpoints
///
/// All endpoints require the `admin` role on the organization.
///
/// # Endpoints
///
/// - `GET    /v1/orgs/:org_id/webhooks` - List webhooks (secrets omitted)
/// - `POST   /v1/orgs/:org_id/webhooks` - Create webhook (secret returned once)
/// - `PATCH  /v1/orgs/:org_id/webhooks/:webhook_id` - Update URL, events, active flag, or rotate secret
/// - `DELETE /v1/orgs/:org_id/webhooks/:webhook_id` - Delete webhook
/// - `POST   /v1/orgs/:org_id/webhooks/:webhook_id/test` - Send a signed `ping`
///
/// # Create
///
/// ```text
/// POST /v1/orgs/org-acme/webhooks
///
/// { "url": "https://hooks.acme.test/portal", "events": ["approval.decided"] }
/// ```
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": "...",
///     "url": "https://hooks.acme.test/portal",
///     "events": ["approval.decided"],
///     "active": true,
///     "secret": "9f86d081884c7d65..."
///   }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{authorize_org, check_id, success, validate_body, ApiResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use portal_shared::{
    auth::{authorization::Role, middleware::AuthContext},
    delivery::DeliveryReport,
    models::webhook::{CreateWebhook, CreatedWebhook, UpdateWebhook, Webhook, WebhookView},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookResponse {
    #[serde(flatten)]
    pub webhook: WebhookView,

    /// New secret, present only when it was rotated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

pub async fn list_webhooks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<WebhookView>>>> {
    authorize_org(&state, &auth, &org_id, Role::Admin).await?;

    let webhooks = Webhook::list_by_org(&state.store, &org_id).await?;
    Ok(success(webhooks.iter().map(WebhookView::from).collect()))
}

pub async fn create_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(req): Json<CreateWebhook>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedWebhook>>)> {
    let user = authorize_org(&state, &auth, &org_id, Role::Admin).await?;
    validate_body(&req)?;

    let webhook = Webhook::create(&state.store, &org_id, req).await?;
    tracing::info!(webhook_id = %webhook.id, org_id = %org_id, created_by = %user.id, "Webhook created");

    Ok((StatusCode::CREATED, success(CreatedWebhook::from(&webhook))))
}

pub async fn update_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, webhook_id)): Path<(String, String)>,
    Json(req): Json<UpdateWebhook>,
) -> ApiResult<Json<ApiResponse<UpdateWebhookResponse>>> {
    authorize_org(&state, &auth, &org_id, Role::Admin).await?;
    check_id("webhookId", &webhook_id)?;
    validate_body(&req)?;

    let rotated = req.regenerate_secret;
    let webhook = Webhook::update(&state.store, &org_id, &webhook_id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webhook not found".to_string()))?;

    if rotated {
        tracing::info!(webhook_id = %webhook.id, "Webhook secret rotated");
    }

    Ok(success(UpdateWebhookResponse {
        webhook: WebhookView::from(&webhook),
        secret: rotated.then(|| webhook.secret.clone()),
    }))
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, webhook_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    authorize_org(&state, &auth, &org_id, Role::Admin).await?;
    check_id("webhookId", &webhook_id)?;

    if !Webhook::delete(&state.store, &org_id, &webhook_id).await? {
        return Err(ApiError::NotFound("Webhook not found".to_string()));
    }

    tracing::info!(webhook_id = %webhook_id, org_id = %org_id, "Webhook deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Sends a `ping` and reports what the remote answered
///
/// Delivery failures are part of the report (`delivered: false`), not an
/// error response.
pub async fn test_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, webhook_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<DeliveryReport>>> {
    authorize_org(&state, &auth, &org_id, Role::Admin).await?;
    check_id("webhookId", &webhook_id)?;

    let webhook = Webhook::find(&state.store, &org_id, &webhook_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webhook not found".to_string()))?;

    let report = match state.dispatcher.ping(&webhook).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(webhook_id = %webhook.id, error = %e, "Webhook test delivery failed");
            DeliveryReport::failed(&webhook, portal_shared::delivery::PING_EVENT, &e)
        }
    };

    Ok(success(report))
}
