/// Webhook delivery
///
/// Posts signed JSON payloads to registered webhooks. Each request carries:
///
/// - `X-Portal-Event`: the event name (`ping`, `approval.decided`, ...)
/// - `X-Portal-Signature`: hex HMAC-SHA256 of the raw body
/// - `X-Portal-Delivery`: a unique delivery id
///
/// Deliveries are attempted once. A non-2xx answer is reported as an
/// unsuccessful delivery, a transport failure as a [`WebhookError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::{SharedStore, StoreError};
use crate::models::webhook::{Webhook, WebhookEvent};

pub const SIGNATURE_HEADER: &str = "X-Portal-Signature";
pub const EVENT_HEADER: &str = "X-Portal-Event";
pub const DELIVERY_HEADER: &str = "X-Portal-Delivery";

/// Event name used by test deliveries
pub const PING_EVENT: &str = "ping";

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to encode payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Delivery to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Body posted to the webhook URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub id: String,
    pub event: String,
    pub org_id: String,
    pub created_at: DateTime<Utc>,
    pub data: Value,
}

/// What happened to one delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub delivery_id: String,
    pub webhook_id: String,
    pub event: String,

    /// True when the remote answered 2xx
    pub delivered: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    pub duration_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryReport {
    /// Report for a delivery that never got an HTTP answer
    pub fn failed(webhook: &Webhook, event: &str, error: &WebhookError) -> Self {
        Self {
            delivery_id: String::new(),
            webhook_id: webhook.id.clone(),
            event: event.to_string(),
            delivered: false,
            status_code: None,
            duration_ms: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Sends webhook payloads over HTTP
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new() -> Result<Self, WebhookError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Posts one event to one webhook
    pub async fn deliver(&self, webhook: &Webhook, event: &str, data: Value) -> Result<DeliveryReport, WebhookError> {
        let payload = WebhookPayload {
            id: uuid::Uuid::new_v4().to_string(),
            event: event.to_string(),
            org_id: webhook.org_id.clone(),
            created_at: Utc::now(),
            data,
        };

        let body = serde_json::to_vec(&payload)?;
        let signature = webhook.generate_signature(&body);
        let started = Instant::now();

        let response = self
            .client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .header(EVENT_HEADER, event)
            .header(SIGNATURE_HEADER, signature)
            .header(DELIVERY_HEADER, &payload.id)
            .body(body)
            .send()
            .await
            .map_err(|e| WebhookError::Transport {
                url: webhook.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let duration_ms = started.elapsed().as_millis() as u64;

        debug!(
            webhook_id = %webhook.id,
            event = %event,
            status = status.as_u16(),
            duration_ms,
            "Webhook delivered"
        );

        Ok(DeliveryReport {
            delivery_id: payload.id,
            webhook_id: webhook.id.clone(),
            event: event.to_string(),
            delivered: status.is_success(),
            status_code: Some(status.as_u16()),
            duration_ms,
            error: None,
        })
    }

    /// Sends a `ping` event
    pub async fn ping(&self, webhook: &Webhook) -> Result<DeliveryReport, WebhookError> {
        let data = serde_json::json!({
            "webhookId": webhook.id,
            "events": webhook.events,
        });
        self.deliver(webhook, PING_EVENT, data).await
    }

    /// Delivers an event to every subscribed webhook of an organization
    ///
    /// Failures are logged and reported, never retried.
    pub async fn notify(
        &self,
        store: &SharedStore,
        org_id: &str,
        event: WebhookEvent,
        data: Value,
    ) -> Result<Vec<DeliveryReport>, WebhookError> {
        let webhooks = Webhook::find_by_event(store, org_id, event).await?;
        let mut reports = Vec::with_capacity(webhooks.len());

        for webhook in &webhooks {
            let report = match self.deliver(webhook, event.as_str(), data.clone()).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(webhook_id = %webhook.id, event = event.as_str(), error = %e, "Webhook delivery failed");
                    DeliveryReport::failed(webhook, event.as_str(), &e)
                }
            };
            reports.push(report);
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::webhook::CreateWebhook;
    use axum::{extract::State, http::HeaderMap, routing::post, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(HeaderMap, bytes::Bytes)>>>;

    async fn capture(State(captured): State<Captured>, headers: HeaderMap, body: bytes::Bytes) -> &'static str {
        captured.lock().unwrap().push((headers, body));
        "ok"
    }

    async fn spawn_receiver() -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().route("/hook", post(capture)).with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/hook", addr), captured)
    }

    async fn webhook(url: &str) -> (SharedStore, Webhook) {
        let store: SharedStore = Arc::new(MemoryStore::new("test"));
        store.initialize_database().await.unwrap();
        let webhook = Webhook::create(&store, "org-1", CreateWebhook {
            url: url.to_string(),
            events: vec![WebhookEvent::ApprovalDecided],
        })
        .await
        .unwrap();
        (store, webhook)
    }

    #[tokio::test]
    async fn test_ping_is_signed() {
        let (url, captured) = spawn_receiver().await;
        let (_store, webhook) = webhook(&url).await;

        let dispatcher = WebhookDispatcher::new().unwrap();
        let report = dispatcher.ping(&webhook).await.unwrap();

        assert!(report.delivered);
        assert_eq!(report.status_code, Some(200));

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (headers, body) = &captured[0];
        assert_eq!(headers[EVENT_HEADER], "ping");
        assert_eq!(
            headers[SIGNATURE_HEADER].to_str().unwrap(),
            webhook.generate_signature(body)
        );

        let payload: WebhookPayload = serde_json::from_slice(body).unwrap();
        assert_eq!(payload.event, "ping");
        assert_eq!(payload.org_id, "org-1");
        assert_eq!(headers[DELIVERY_HEADER].to_str().unwrap(), payload.id);
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let (url, _captured) = spawn_receiver().await;
        let (_store, webhook) = webhook(&url.replace("/hook", "/missing")).await;

        let report = WebhookDispatcher::new().unwrap().ping(&webhook).await.unwrap();
        assert!(!report.delivered);
        assert_eq!(report.status_code, Some(404));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Port 9 (discard) is not listening on loopback
        let (_store, webhook) = webhook("http://127.0.0.1:9/hook").await;

        let err = WebhookDispatcher::new().unwrap().ping(&webhook).await.unwrap_err();
        assert!(matches!(err, WebhookError::Transport { .. }));

        let report = DeliveryReport::failed(&webhook, PING_EVENT, &err);
        assert!(!report.delivered);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_notify_only_subscribed() {
        let (url, captured) = spawn_receiver().await;
        let (store, _webhook) = webhook(&url).await;
        let dispatcher = WebhookDispatcher::new().unwrap();

        let reports = dispatcher
            .notify(&store, "org-1", WebhookEvent::ProjectCreated, Value::Null)
            .await
            .unwrap();
        assert!(reports.is_empty());

        let reports = dispatcher
            .notify(&store, "org-1", WebhookEvent::ApprovalDecided, serde_json::json!({"id": "a-1"}))
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].delivered);
        assert_eq!(captured.lock().unwrap()[0].0[EVENT_HEADER], "approval.decided");
    }
}
