/// Role-based access control
///
/// Users carry a list of role grants, each tied to a scope:
///
/// ```json
/// { "scope": "org", "scopeId": "org-acme", "role": "admin" }
/// ```
///
/// # Role Hierarchy
///
/// | Role      | Rank |
/// |-----------|------|
/// | `owner`   | 5    |
/// | `admin`   | 4    |
/// | `manager` | 3    |
/// | `member`  | 2    |
/// | `client`  | 1    |
///
/// A grant satisfies a requirement when the scope is the same, the scope id
/// is the same (when the requirement names one) and its rank is at least the
/// required rank. There is no inheritance between scopes in [`has_role`];
/// [`can_access_project`] is the helper that also accepts an org grant on
/// the project's owning organization.
///
/// Everything here is a pure function over the grant list.
///
/// # Example
///
/// ```
/// use portal_shared::auth::authorization::{has_role, Role, RoleGrant, RoleRequirement, Scope};
///
/// let grants = vec![RoleGrant::org("org-acme", Role::Client)];
///
/// assert!(has_role(&grants, &RoleRequirement::org("org-acme", Role::Client)));
/// assert!(!has_role(&grants, &RoleRequirement::org("org-acme", Role::Manager)));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No grant at all for the scope
    #[error("No role in {scope} '{scope_id}'")]
    NoGrant { scope: Scope, scope_id: String },

    /// A grant exists but ranks below the requirement
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },
}

/// Portal roles, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Organization owner, billing and everything below
    Owner,

    /// Manages users, webhooks and integrations
    Admin,

    /// Runs projects, creates them and decides approvals
    Manager,

    /// Works on projects: tasks, assets, workflows
    Member,

    /// External client, read access plus approvals
    Client,
}

impl Role {
    /// Every role, strongest first
    pub const ALL: [Role; 5] = [Role::Owner, Role::Admin, Role::Manager, Role::Member, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
            Role::Client => "client",
        }
    }

    /// Numeric rank used for comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Role::Owner => 5,
            Role::Admin => 4,
            Role::Manager => 3,
            Role::Member => 2,
            Role::Client => 1,
        }
    }

    /// Whether this role is at least as strong as `required`
    pub fn has_permission(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role '{}'", s))
    }
}

/// What a grant applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Org,
    Project,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Org => "org",
            Scope::Project => "project",
        })
    }
}

/// A role held within one org or project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrant {
    pub scope: Scope,
    pub scope_id: String,
    pub role: Role,
}

impl RoleGrant {
    pub fn org(org_id: &str, role: Role) -> Self {
        Self {
            scope: Scope::Org,
            scope_id: org_id.to_string(),
            role,
        }
    }

    pub fn project(project_id: &str, role: Role) -> Self {
        Self {
            scope: Scope::Project,
            scope_id: project_id.to_string(),
            role,
        }
    }
}

/// What a caller must hold
///
/// Without a `scope_id`, any grant in the scope counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequirement {
    pub scope: Scope,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,

    pub role: Role,
}

impl RoleRequirement {
    pub fn org(org_id: &str, role: Role) -> Self {
        Self {
            scope: Scope::Org,
            scope_id: Some(org_id.to_string()),
            role,
        }
    }

    pub fn project(project_id: &str, role: Role) -> Self {
        Self {
            scope: Scope::Project,
            scope_id: Some(project_id.to_string()),
            role,
        }
    }
}

fn grant_matches(grant: &RoleGrant, scope: Scope, scope_id: Option<&str>) -> bool {
    grant.scope == scope && scope_id.map_or(true, |id| grant.scope_id == id)
}

/// Checks whether any grant satisfies the requirement
///
/// # Example
///
/// ```
/// use portal_shared::auth::authorization::{has_role, Role, RoleGrant, RoleRequirement, Scope};
///
/// let grants = vec![RoleGrant::project("proj-1", Role::Manager)];
///
/// assert!(has_role(&grants, &RoleRequirement::project("proj-1", Role::Member)));
/// assert!(!has_role(&grants, &RoleRequirement::project("proj-2", Role::Member)));
/// assert!(!has_role(&grants, &RoleRequirement::org("org-acme", Role::Client)));
/// ```
pub fn has_role(grants: &[RoleGrant], requirement: &RoleRequirement) -> bool {
    grants.iter().any(|grant| {
        grant_matches(grant, requirement.scope, requirement.scope_id.as_deref())
            && grant.role.has_permission(requirement.role)
    })
}

/// Strongest role held in a scope (and scope id, when given)
pub fn highest_role(grants: &[RoleGrant], scope: Scope, scope_id: Option<&str>) -> Option<Role> {
    grants
        .iter()
        .filter(|grant| grant_matches(grant, scope, scope_id))
        .map(|grant| grant.role)
        .max_by_key(Role::rank)
}

/// Project-level gate: an org grant on the owning organization or a
/// project grant on the project itself
pub fn can_access_project(grants: &[RoleGrant], org_id: &str, project_id: &str, role: Role) -> bool {
    has_role(grants, &RoleRequirement::org(org_id, role))
        || has_role(grants, &RoleRequirement::project(project_id, role))
}

/// Requires `role` or higher in an organization
///
/// # Errors
///
/// - `AuthzError::NoGrant` when the caller holds nothing in the org
/// - `AuthzError::InsufficientRole` when the grant ranks too low
pub fn require_org_role(grants: &[RoleGrant], org_id: &str, role: Role) -> Result<(), AuthzError> {
    let requirement = RoleRequirement::org(org_id, role);
    if has_role(grants, &requirement) {
        return Ok(());
    }

    match highest_role(grants, Scope::Org, Some(org_id)) {
        Some(actual) => Err(AuthzError::InsufficientRole {
            required: role,
            actual,
        }),
        None => Err(AuthzError::NoGrant {
            scope: Scope::Org,
            scope_id: org_id.to_string(),
        }),
    }
}

/// Requires `role` or higher on a project, through either scope
pub fn require_project_role(
    grants: &[RoleGrant],
    org_id: &str,
    project_id: &str,
    role: Role,
) -> Result<(), AuthzError> {
    if can_access_project(grants, org_id, project_id, role) {
        return Ok(());
    }

    let best = [
        highest_role(grants, Scope::Org, Some(org_id)),
        highest_role(grants, Scope::Project, Some(project_id)),
    ]
    .into_iter()
    .flatten()
    .max_by_key(Role::rank);

    match best {
        Some(actual) => Err(AuthzError::InsufficientRole {
            required: role,
            actual,
        }),
        None => Err(AuthzError::NoGrant {
            scope: Scope::Project,
            scope_id: project_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_ranks() {
        let ranks: Vec<u8> = Role::ALL.iter().map(Role::rank).collect();
        assert_eq!(ranks, vec![5, 4, 3, 2, 1]);

        assert!(Role::Owner.has_permission(Role::Client));
        assert!(Role::Manager.has_permission(Role::Manager));
        assert!(!Role::Member.has_permission(Role::Manager));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_client_fails_manager_requirement() {
        let grants = vec![RoleGrant::org("org-1", Role::Client)];
        assert!(!has_role(&grants, &RoleRequirement::org("org-1", Role::Manager)));
        assert!(has_role(&grants, &RoleRequirement::org("org-1", Role::Client)));
    }

    #[test]
    fn test_scope_must_match() {
        let grants = vec![RoleGrant::org("org-1", Role::Owner)];
        assert!(!has_role(&grants, &RoleRequirement::project("org-1", Role::Client)));
        assert!(!has_role(&grants, &RoleRequirement::org("org-2", Role::Client)));
    }

    #[test]
    fn test_requirement_without_scope_id() {
        let grants = vec![RoleGrant::project("p-9", Role::Member)];
        let any_project = RoleRequirement {
            scope: Scope::Project,
            scope_id: None,
            role: Role::Member,
        };
        assert!(has_role(&grants, &any_project));

        let stronger = RoleRequirement {
            role: Role::Admin,
            ..any_project
        };
        assert!(!has_role(&grants, &stronger));
    }

    #[test]
    fn test_empty_grants() {
        assert!(!has_role(&[], &RoleRequirement::org("org-1", Role::Client)));
        assert_eq!(highest_role(&[], Scope::Org, None), None);
    }

    #[test]
    fn test_highest_role_picks_strongest() {
        let grants = vec![
            RoleGrant::org("org-1", Role::Member),
            RoleGrant::org("org-1", Role::Admin),
            RoleGrant::org("org-2", Role::Owner),
        ];
        assert_eq!(highest_role(&grants, Scope::Org, Some("org-1")), Some(Role::Admin));
        assert_eq!(highest_role(&grants, Scope::Org, None), Some(Role::Owner));
    }

    #[test]
    fn test_can_access_project_via_either_scope() {
        let org_grant = vec![RoleGrant::org("org-1", Role::Manager)];
        assert!(can_access_project(&org_grant, "org-1", "p-1", Role::Member));
        assert!(!can_access_project(&org_grant, "org-2", "p-1", Role::Member));

        let project_grant = vec![RoleGrant::project("p-1", Role::Client)];
        assert!(can_access_project(&project_grant, "org-1", "p-1", Role::Client));
        assert!(!can_access_project(&project_grant, "org-1", "p-1", Role::Member));
        assert!(!can_access_project(&project_grant, "org-1", "p-2", Role::Client));
    }

    #[test]
    fn test_require_org_role_errors() {
        let grants = vec![RoleGrant::org("org-1", Role::Member)];

        assert!(require_org_role(&grants, "org-1", Role::Member).is_ok());
        assert_eq!(
            require_org_role(&grants, "org-1", Role::Admin),
            Err(AuthzError::InsufficientRole {
                required: Role::Admin,
                actual: Role::Member,
            })
        );
        assert!(matches!(
            require_org_role(&grants, "org-2", Role::Client),
            Err(AuthzError::NoGrant { scope: Scope::Org, .. })
        ));
    }

    #[test]
    fn test_require_project_role_reports_best_grant() {
        let grants = vec![
            RoleGrant::org("org-1", Role::Client),
            RoleGrant::project("p-1", Role::Member),
        ];

        assert!(require_project_role(&grants, "org-1", "p-1", Role::Member).is_ok());
        assert_eq!(
            require_project_role(&grants, "org-1", "p-1", Role::Manager),
            Err(AuthzError::InsufficientRole {
                required: Role::Manager,
                actual: Role::Member,
            })
        );
        assert!(matches!(
            require_project_role(&[], "org-1", "p-1", Role::Client),
            Err(AuthzError::NoGrant { scope: Scope::Project, .. })
        ));
    }

    #[test]
    fn test_grant_wire_format() {
        let grant: RoleGrant =
            serde_json::from_value(json!({"scope": "project", "scopeId": "p-1", "role": "manager"})).unwrap();
        assert_eq!(grant, RoleGrant::project("p-1", Role::Manager));

        let bad = serde_json::from_value::<RoleGrant>(json!({"scope": "team", "scopeId": "t", "role": "member"}));
        assert!(bad.is_err());
    }
}
