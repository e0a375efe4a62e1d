// Common test utilities for integration tests
//
// Builds the router on top of a seeded `MemoryStore` and provides
// helpers to mint session tokens and send requests in-process.
//
// Fixture layout:
//
// - `org-acme` with project `proj-launch` (two work items, one pending approval)
// - `user-olivia`: org owner
// - `user-dana`: org manager
// - `user-max`: member of `proj-launch`
// - `user-carla`: client on `proj-launch`
// - `org-other` with project `proj-other`, owned by `user-zed`

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use portal_api::app::{build_router, AppState};
use portal_api::config::Config;
use portal_shared::auth::authorization::{Role, RoleGrant};
use portal_shared::auth::jwt::{create_token, Claims};
use portal_shared::db::{MemoryStore, SharedStore};
use portal_shared::models::approval::{Approval, CreateApproval};
use portal_shared::models::organization::{Organization, Plan};
use portal_shared::models::project::{CreateProject, Project, ProjectStatus};
use portal_shared::models::user::User;
use portal_shared::models::work_item::{CreateWorkItem, WorkItem, WorkItemStatus};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub const ORG: &str = "org-acme";
pub const OTHER_ORG: &str = "org-other";
pub const PROJECT: &str = "proj-launch";
pub const OTHER_PROJECT: &str = "proj-other";
pub const APPROVAL: &str = "appr-hero-banner";

pub const OWNER: &str = "user-olivia";
pub const MANAGER: &str = "user-dana";
pub const MEMBER: &str = "user-max";
pub const CLIENT: &str = "user-carla";
pub const OTHER_OWNER: &str = "user-zed";

/// Test context: router plus direct store access
pub struct TestContext {
    pub store: SharedStore,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a router over a freshly initialized and seeded memory store
    pub async fn new() -> anyhow::Result<Self> {
        let store: SharedStore = Arc::new(MemoryStore::new("portal-test"));
        store.initialize_database().await?;
        seed(&store).await?;

        Ok(Self::with_store(store))
    }

    /// Creates a router over any store, without seeding it
    pub fn with_store(store: SharedStore) -> Self {
        Self::with_config(store, Config::for_memory(SECRET))
    }

    /// Creates a router with a custom configuration
    pub fn with_config(store: SharedStore, config: Config) -> Self {
        let state = AppState::new(store.clone(), config.clone()).expect("app state");
        let app = build_router(state);

        TestContext { store, app, config }
    }

    /// Bearer header value for a fixture user of `org-acme`
    pub fn auth_header(&self, user_id: &str) -> String {
        bearer(user_id, ORG)
    }

    pub async fn get(&self, uri: &str, user_id: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, self.auth_header(user_id))
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, user_id: &str, body: Value) -> TestResponse {
        self.json_request("POST", uri, user_id, body).await
    }

    pub async fn json_request(&self, method: &str, uri: &str, user_id: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, self.auth_header(user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse { status, headers, body }
    }
}

/// Buffered response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {}", e, String::from_utf8_lossy(&self.body)))
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_else(|| panic!("missing header {}", name))
    }

    /// Asserts the status, printing the body on mismatch
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}

/// Bearer header value for any user/org pair
pub fn bearer(user_id: &str, org_id: &str) -> String {
    let claims = Claims::new(user_id, org_id, &format!("{}@example.test", user_id));
    format!("Bearer {}", create_token(&claims, SECRET).unwrap())
}

fn user(id: &str, org_id: &str, roles: Vec<RoleGrant>) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        org_id: org_id.to_string(),
        email: format!("{}@example.test", id),
        name: id.trim_start_matches("user-").to_string(),
        avatar_url: None,
        roles,
        created_at: now,
        updated_at: now,
    }
}

fn organization(id: &str, name: &str) -> Organization {
    let now = Utc::now();
    Organization {
        id: id.to_string(),
        org_id: id.to_string(),
        name: name.to_string(),
        slug: id.trim_start_matches("org-").to_string(),
        plan: Plan::Growth,
        created_at: now,
        updated_at: now,
    }
}

pub fn project(org_id: &str, id: &str, name: &str) -> Project {
    Project::build(
        org_id,
        id,
        CreateProject {
            name: name.to_string(),
            client_name: "Acme Outdoor".to_string(),
            description: Some("Spring product launch".to_string()),
            status: ProjectStatus::Active,
            budget: 25_000.0,
            start_date: None,
            end_date: None,
        },
    )
}

fn work_item(id: &str, title: &str, status: WorkItemStatus) -> WorkItem {
    WorkItem::build(
        PROJECT,
        id,
        CreateWorkItem {
            title: title.to_string(),
            description: None,
            status,
            priority: 2,
            assignee_id: Some(MEMBER.to_string()),
            due_date: None,
        },
    )
}

async fn seed(store: &SharedStore) -> anyhow::Result<()> {
    Organization::upsert(store, &organization(ORG, "Acme Outdoor")).await?;
    Organization::upsert(store, &organization(OTHER_ORG, "Other Co")).await?;

    for user in [
        user(OWNER, ORG, vec![RoleGrant::org(ORG, Role::Owner)]),
        user(MANAGER, ORG, vec![RoleGrant::org(ORG, Role::Manager)]),
        user(MEMBER, ORG, vec![RoleGrant::project(PROJECT, Role::Member)]),
        user(CLIENT, ORG, vec![RoleGrant::project(PROJECT, Role::Client)]),
        user(OTHER_OWNER, OTHER_ORG, vec![RoleGrant::org(OTHER_ORG, Role::Owner)]),
    ] {
        User::upsert(store, &user).await?;
    }

    Project::upsert(store, &project(ORG, PROJECT, "Spring Launch")).await?;
    Project::upsert(store, &project(OTHER_ORG, OTHER_PROJECT, "Other Launch")).await?;

    WorkItem::upsert(store, &work_item("wi-brief", "Write creative brief", WorkItemStatus::Done)).await?;
    WorkItem::upsert(store, &work_item("wi-banner", "Design hero banner", WorkItemStatus::InProgress)).await?;

    let approval = Approval::build(
        PROJECT,
        APPROVAL,
        MEMBER,
        CreateApproval {
            subject_type: "asset".to_string(),
            subject_id: "asset-hero-banner".to_string(),
            comment: None,
        },
    );
    Approval::upsert(store, &approval).await?;

    Ok(())
}
