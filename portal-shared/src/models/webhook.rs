/// Webhook model
///
/// Webhooks let an organization receive HTTP callbacks when something
/// happens in the portal (a project is created, an approval is decided, a
/// workflow finishes...). Partitioned on `/orgId`.
///
/// # Security
///
/// - Each webhook gets a random 32-byte secret, stored hex-encoded
/// - The secret is returned once, in the create response, and never again
/// - Each delivery carries an HMAC-SHA256 of the body, keyed with the hex
///   secret string, in the `X-Portal-Signature` header
///
/// # Example
///
/// ```no_run
/// use portal_shared::db::{MemoryStore, SharedStore};
/// use portal_shared::models::webhook::{CreateWebhook, Webhook, WebhookEvent};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SharedStore = Arc::new(MemoryStore::new("portal"));
/// store.initialize_database().await?;
///
/// let webhook = Webhook::create(&store, "org-acme", CreateWebhook {
///     url: "https://hooks.acme.test/portal".to_string(),
///     events: vec![WebhookEvent::ApprovalDecided],
/// }).await?;
///
/// let signature = webhook.generate_signature(b"{\"event\":\"ping\"}");
/// assert_eq!(signature.len(), 64);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

/// Maximum webhook URL length
pub const MAX_URL_LENGTH: u64 = 2048;

/// Events a webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "project.created")]
    ProjectCreated,

    #[serde(rename = "project.updated")]
    ProjectUpdated,

    #[serde(rename = "approval.requested")]
    ApprovalRequested,

    #[serde(rename = "approval.decided")]
    ApprovalDecided,

    #[serde(rename = "export.generated")]
    ExportGenerated,

    #[serde(rename = "workflow.completed")]
    WorkflowCompleted,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ProjectCreated => "project.created",
            WebhookEvent::ProjectUpdated => "project.updated",
            WebhookEvent::ApprovalRequested => "approval.requested",
            WebhookEvent::ApprovalDecided => "approval.decided",
            WebhookEvent::ExportGenerated => "export.generated",
            WebhookEvent::WorkflowCompleted => "workflow.completed",
        }
    }
}

fn default_events() -> Vec<WebhookEvent> {
    vec![WebhookEvent::ApprovalDecided, WebhookEvent::WorkflowCompleted]
}

/// Stored webhook, secret included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,

    /// Owning organization (partition key)
    pub org_id: String,

    /// Callback URL (http or https)
    pub url: String,

    /// Hex-encoded signing secret
    pub secret: String,

    pub active: bool,

    pub events: Vec<WebhookEvent>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Webhook {
    const CONTAINER: &'static str = "webhooks";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.org_id
    }
}

/// Webhook as returned by the API (no secret)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookView {
    pub id: String,
    pub org_id: String,
    pub url: String,
    pub active: bool,
    pub events: Vec<WebhookEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Webhook> for WebhookView {
    fn from(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id.clone(),
            org_id: webhook.org_id.clone(),
            url: webhook.url.clone(),
            active: webhook.active,
            events: webhook.events.clone(),
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// Create response: the view plus the one-time plaintext secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWebhook {
    #[serde(flatten)]
    pub webhook: WebhookView,

    pub secret: String,
}

impl From<&Webhook> for CreatedWebhook {
    fn from(webhook: &Webhook) -> Self {
        Self {
            webhook: WebhookView::from(webhook),
            secret: webhook.secret.clone(),
        }
    }
}

/// Checks that a callback URL parses and uses http or https
pub fn validate_webhook_url(url: &str) -> Result<(), ValidationError> {
    let scheme_ok = url::Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some())
        .unwrap_or(false);

    if !scheme_ok {
        let mut err = ValidationError::new("webhook_url");
        err.message = Some(Cow::from("URL must be an absolute http:// or https:// URL"));
        return Err(err);
    }

    Ok(())
}

fn validate_events(events: &[WebhookEvent]) -> Result<(), ValidationError> {
    if events.is_empty() {
        let mut err = ValidationError::new("events");
        err.message = Some(Cow::from("At least one event is required"));
        return Err(err);
    }
    Ok(())
}

/// Input for creating a webhook
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhook {
    #[validate(
        length(max = MAX_URL_LENGTH, message = "URL must be at most 2048 characters"),
        custom(function = "validate_webhook_url")
    )]
    pub url: String,

    #[serde(default = "default_events")]
    #[validate(custom(function = "validate_events"))]
    pub events: Vec<WebhookEvent>,
}

/// Input for updating a webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhook {
    #[validate(
        length(max = MAX_URL_LENGTH, message = "URL must be at most 2048 characters"),
        custom(function = "validate_webhook_url")
    )]
    pub url: Option<String>,

    #[validate(custom(function = "validate_events"))]
    pub events: Option<Vec<WebhookEvent>>,

    /// Replace the signing secret
    #[serde(default)]
    pub regenerate_secret: bool,

    pub active: Option<bool>,
}

impl Webhook {
    /// Generates a random 32-byte secret, hex-encoded
    fn generate_secret() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// HMAC-SHA256 of `payload`, hex-encoded
    ///
    /// Sent in the `X-Portal-Signature` header.
    pub fn generate_signature(&self, payload: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(payload);

        hex::encode(mac.finalize().into_bytes())
    }

    /// Whether the webhook should receive `event`
    pub fn subscribes_to(&self, event: WebhookEvent) -> bool {
        self.active && self.events.contains(&event)
    }

    /// Creates a webhook with a fresh secret
    pub async fn create(store: &SharedStore, org_id: &str, data: CreateWebhook) -> StoreResult<Self> {
        let now = Utc::now();

        let webhook = Webhook {
            id: super::new_id(),
            org_id: org_id.to_string(),
            url: data.url,
            secret: Self::generate_secret(),
            active: true,
            events: data.events,
            created_at: now,
            updated_at: now,
        };

        get_container::<Webhook>(store).create(&webhook).await
    }

    /// Point read within an organization
    pub async fn find(store: &SharedStore, org_id: &str, id: &str) -> StoreResult<Option<Self>> {
        get_container::<Webhook>(store).read(org_id, id).await
    }

    /// Applies an update; `None` when the webhook does not exist
    pub async fn update(
        store: &SharedStore,
        org_id: &str,
        id: &str,
        data: UpdateWebhook,
    ) -> StoreResult<Option<Self>> {
        let Some(mut webhook) = Self::find(store, org_id, id).await? else {
            return Ok(None);
        };

        if let Some(url) = data.url {
            webhook.url = url;
        }
        if let Some(events) = data.events {
            webhook.events = events;
        }
        if data.regenerate_secret {
            webhook.secret = Self::generate_secret();
        }
        if let Some(active) = data.active {
            webhook.active = active;
        }
        webhook.updated_at = Utc::now();

        get_container::<Webhook>(store).replace(&webhook).await.map(Some)
    }

    /// Deletes a webhook
    pub async fn delete(store: &SharedStore, org_id: &str, id: &str) -> StoreResult<bool> {
        get_container::<Webhook>(store).delete(org_id, id).await
    }

    /// Lists all webhooks for an organization, newest first
    pub async fn list_by_org(store: &SharedStore, org_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.orgId = @orgId ORDER BY c.createdAt DESC").param("@orgId", org_id);
        get_container::<Webhook>(store).query(&query, Some(org_id)).await
    }

    /// Active webhooks subscribed to an event
    pub async fn find_by_event(store: &SharedStore, org_id: &str, event: WebhookEvent) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.orgId = @orgId AND c.active = true ORDER BY c.createdAt DESC")
            .param("@orgId", org_id);

        Ok(get_container::<Webhook>(store)
            .query(&query, Some(org_id))
            .await?
            .into_iter()
            .filter(|w| w.subscribes_to(event))
            .collect())
    }
}
