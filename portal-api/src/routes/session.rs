/// Session validation endpoint
///
/// The front end calls this after sign-in to turn its session token into
/// the user profile and role grants.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/session/validate
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "user-dana", "orgId": "org-acme", "email": "dana@acme.test", ... },
///     "roles": [{ "scope": "org", "scopeId": "org-acme", "role": "manager" }],
///     "expiresAt": "2024-04-04T09:00:00Z"
///   }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, malformed, expired or forged token
/// - `404 Not Found`: Token is valid but the user no longer exists

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{success, ApiResponse},
};
use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, TimeZone, Utc};
use portal_shared::{
    auth::{authorization::RoleGrant, middleware::authenticate},
    models::user::User,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub roles: Vec<RoleGrant>,
    pub expires_at: DateTime<Utc>,
}

pub async fn validate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let user = User::find(&state.store, &auth.org_id, &auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let expires_at = Utc
        .timestamp_opt(auth.expires_at, 0)
        .single()
        .ok_or_else(|| ApiError::Unauthorized("Invalid token expiry".to_string()))?;

    tracing::debug!(user_id = %user.id, org_id = %user.org_id, "Session validated");

    Ok(success(SessionResponse {
        roles: user.roles.clone(),
        user,
        expires_at,
    }))
}
