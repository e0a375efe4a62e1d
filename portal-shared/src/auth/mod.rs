/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: session token creation and validation (HS256, `NEXTAUTH_SECRET`)
/// - [`middleware`]: bearer token extraction and the `AuthContext` added to requests
/// - [`authorization`]: role hierarchy and scope-matched grant checks
///
/// # Example
///
/// ```
/// use portal_shared::auth::authorization::{has_role, Role, RoleGrant, RoleRequirement};
/// use portal_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-nextauth-secret-of-at-least-32-bytes";
/// let token = create_token(&Claims::new("user-1", "org-acme", "a@acme.test"), secret)?;
/// let claims = validate_token(&token, secret)?;
///
/// let grants = vec![RoleGrant::org(&claims.org_id, Role::Manager)];
/// assert!(has_role(&grants, &RoleRequirement::org("org-acme", Role::Member)));
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
