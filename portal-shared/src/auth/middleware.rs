/// Request authentication for Axum
///
/// Validates the `Authorization: Bearer <token>` header and turns the
/// session claims into an [`AuthContext`] stored in request extensions.
///
/// Role grants are not part of the token: handlers load the user document
/// and check grants with [`crate::auth::authorization`], so a revoked role
/// takes effect without waiting for the session to expire.
///
/// # Example
///
/// ```
/// use axum::http::HeaderMap;
/// use portal_shared::auth::middleware::{authenticate, AuthError};
///
/// let err = authenticate(&HeaderMap::new(), "secret").unwrap_err();
/// assert!(matches!(err, AuthError::MissingCredentials));
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{bearer_token, validate_token, Claims, JwtError};

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// User id (token subject)
    pub user_id: String,

    /// Organization the session is bound to
    pub org_id: String,

    /// User email
    pub email: String,

    /// Session expiry (Unix timestamp)
    pub expires_at: i64,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            org_id: claims.org_id.clone(),
            email: claims.email.clone(),
            expires_at: claims.exp,
        }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Authorization header was not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid token issuer".to_string()),
            JwtError::InvalidFormat(msg) => AuthError::InvalidFormat(msg),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Every authentication failure is a 401 with the error envelope
        let body = Json(json!({
            "success": false,
            "error": "unauthorized",
            "message": self.to_string(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Validates the bearer token in `headers`
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when there is no Authorization header
/// - `AuthError::InvalidFormat` when it is not `Bearer <token>`
/// - `AuthError::InvalidToken` when signature, issuer or expiry checks fail
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(auth_header)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "middleware-test-secret-32-bytes-long!";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new("user-1", "org-1", "a@b.test");
        let context = AuthContext::from_claims(&claims);

        assert_eq!(context.user_id, "user-1");
        assert_eq!(context.org_id, "org-1");
        assert_eq!(context.email, "a@b.test");
        assert_eq!(context.expires_at, claims.exp);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let token = create_token(&Claims::new("user-1", "org-1", "a@b.test"), SECRET).unwrap();
        let context = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(context.user_id, "user-1");
    }

    #[test]
    fn test_authenticate_failures() {
        assert!(matches!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate(&headers_with("Token abc"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate(&headers_with("Bearer abc"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));

        let expired = Claims::with_expiration("u", "o", "e@x.test", Duration::seconds(-120));
        let token = create_token(&expired, SECRET).unwrap();
        let err = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
