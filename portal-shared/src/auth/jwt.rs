/// Session token generation and validation
///
/// The front end signs users in through NextAuth and forwards the session
/// as a bearer token. Tokens are HS256 JWTs signed with `NEXTAUTH_SECRET`.
///
/// # Claims
///
/// - `sub`: user id
/// - `orgId`: the organization the session is bound to
/// - `email`: user email
/// - `iss`: always `marketing-portal`
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use portal_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-nextauth-secret-of-at-least-32-bytes";
/// let claims = Claims::new("user-dana", "org-acme", "dana@acme.test");
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, "user-dana");
/// assert_eq!(validated.org_id, "org-acme");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const ISSUER: &str = "marketing-portal";

/// Minimum secret length accepted for signing
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Header was not `Bearer <token>`
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// Issuer did not match
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Session claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject - user id
    pub sub: String,

    /// Organization the session belongs to
    pub org_id: String,

    /// User email
    pub email: String,

    /// Issuer - always "marketing-portal"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Session lifetime used by [`Claims::new`] (NextAuth's default)
    pub fn default_expiration() -> Duration {
        Duration::days(30)
    }

    /// Creates claims with the default expiration
    pub fn new(user_id: &str, org_id: &str, email: &str) -> Self {
        Self::with_expiration(user_id, org_id, email, Self::default_expiration())
    }

    /// Creates claims with a custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use portal_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration("user-1", "org-1", "a@b.test", Duration::hours(1));
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(user_id: &str, org_id: &str, email: &str, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            org_id: org_id.to_string(),
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiration as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, `exp`, `nbf` and the issuer.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Extracts the token from an `Authorization: Bearer <token>` value
///
/// # Example
///
/// ```
/// use portal_shared::auth::jwt::bearer_token;
///
/// assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
/// assert!(bearer_token("Basic dXNlcg==").is_err());
/// ```
pub fn bearer_token(header_value: &str) -> Result<&str, JwtError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JwtError::InvalidFormat("Expected Bearer token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("user-1", "org-1", "user@example.com");

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.org_id, "org-1");
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims::new("user-1", "org-1", "user@example.com");
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["orgId"], "org-1");
        assert!(value.get("org_id").is_none());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("user-1", "org-1", "user@example.com");
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new("user-1", "org-1", "user@example.com");
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration("user-1", "org-1", "user@example.com", Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new("user-1", "org-1", "user@example.com");
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }

    #[test]
    fn test_expires_at() {
        let claims = Claims::with_expiration("u", "o", "e@x.test", Duration::hours(2));
        assert_eq!(claims.expires_at().timestamp(), claims.exp);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer tok").unwrap(), "tok");
        assert!(bearer_token("Bearer ").is_err());
        assert!(bearer_token("bearer tok").is_err());
        assert!(bearer_token("tok").is_err());
    }
}
