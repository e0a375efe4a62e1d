/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use portal_api::{app::AppState, config::Config};
/// use portal_shared::db::{MemoryStore, SharedStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store: SharedStore = Arc::new(MemoryStore::new(&config.cosmos.database_id));
/// let state = AppState::new(store, config)?;
/// let app = portal_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use portal_shared::{
    auth::middleware::{authenticate, AuthError},
    db::SharedStore,
    delivery::{WebhookDispatcher, WebhookError},
    models::webhook::WebhookEvent,
    workflow::{SharedRunner, SimulatedRunner},
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` (or wraps one), so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: SharedStore,

    /// Application configuration
    pub config: Arc<Config>,

    /// Workflow button runner
    pub runner: SharedRunner,

    /// Outgoing webhook client
    pub dispatcher: WebhookDispatcher,
}

impl AppState {
    /// Creates application state with the simulated workflow runner
    pub fn new(store: SharedStore, config: Config) -> Result<Self, WebhookError> {
        Ok(Self {
            store,
            config: Arc::new(config),
            runner: Arc::new(SimulatedRunner::new()),
            dispatcher: WebhookDispatcher::new()?,
        })
    }

    /// Replaces the workflow runner
    pub fn with_runner(mut self, runner: SharedRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Secret used to validate session tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.secret
    }

    /// Delivers an event to subscribed webhooks in the background
    ///
    /// The request that triggered the event does not wait for delivery.
    pub fn notify(&self, org_id: &str, event: WebhookEvent, data: Value) {
        let store = self.store.clone();
        let dispatcher = self.dispatcher.clone();
        let org_id = org_id.to_string();

        tokio::spawn(async move {
            match dispatcher.notify(&store, &org_id, event, data).await {
                Ok(reports) if !reports.is_empty() => {
                    let delivered = reports.iter().filter(|r| r.delivered).count();
                    tracing::debug!(
                        org_id = %org_id,
                        event = event.as_str(),
                        delivered,
                        total = reports.len(),
                        "Webhook fan-out finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(org_id = %org_id, event = event.as_str(), error = %e, "Webhook fan-out failed"),
            }
        });
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/
///     ├── GET  /health                          # Health check (public)
///     ├── POST /auth/session/validate           # Session validation (bearer token)
///     ├── /orgs/:org_id/                        # (authenticated)
///     │   ├── GET|POST /projects
///     │   ├── GET      /projects/:project_id
///     │   ├── GET|POST /webhooks
///     │   ├── PATCH|DELETE /webhooks/:webhook_id
///     │   └── POST     /webhooks/:webhook_id/test
///     └── /projects/:project_id/                # (authenticated)
///         ├── GET|POST /work-items
///         ├── GET|POST /approvals
///         ├── POST     /approvals/:approval_id/decision
///         ├── GET      /export/pdf
///         ├── GET      /export/xlsx
///         └── POST     /workflows/:action
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new().route("/session/validate", post(routes::session::validate_session));

    // Organization-scoped resources (require JWT authentication)
    let org_routes = Router::new()
        .route(
            "/:org_id/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/:org_id/projects/:project_id", get(routes::projects::get_project))
        .route(
            "/:org_id/webhooks",
            get(routes::webhooks::list_webhooks).post(routes::webhooks::create_webhook),
        )
        .route(
            "/:org_id/webhooks/:webhook_id",
            patch(routes::webhooks::update_webhook).delete(routes::webhooks::delete_webhook),
        )
        .route("/:org_id/webhooks/:webhook_id/test", post(routes::webhooks::test_webhook))
        .layer(axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    // Project-scoped resources (require JWT authentication)
    let project_routes = Router::new()
        .route(
            "/:project_id/work-items",
            get(routes::work_items::list_work_items).post(routes::work_items::create_work_item),
        )
        .route(
            "/:project_id/approvals",
            get(routes::approvals::list_approvals).post(routes::approvals::create_approval),
        )
        .route(
            "/:project_id/approvals/:approval_id/decision",
            post(routes::approvals::decide_approval),
        )
        .route("/:project_id/export/pdf", get(routes::exports::export_pdf))
        .route("/:project_id/export/xlsx", get(routes::exports::export_xlsx))
        .route("/:project_id/workflows/:action", post(routes::workflows::run_workflow))
        .layer(axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .merge(health_routes.clone())
        .nest("/auth", auth_routes)
        .nest("/orgs", org_routes)
        .nest("/projects", project_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::CONTENT_DISPOSITION])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AuthError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    tracing::debug!(user_id = %auth_context.user_id, org_id = %auth_context.org_id, "Authenticated request");

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
