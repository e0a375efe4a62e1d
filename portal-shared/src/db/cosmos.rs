/// Azure Cosmos DB REST client
///
/// Talks to the Cosmos DB SQL API directly over HTTPS with master-key
/// authorization. Each request carries:
///
/// - `x-ms-date`: RFC 1123 timestamp
/// - `x-ms-version`: REST API version
/// - `authorization`: URL-encoded `type=master&ver=1.0&sig=<signature>`
///
/// where the signature is the base64 HMAC-SHA256 (keyed with the decoded
/// account key) of:
///
/// ```text
/// {verb}\n{resource type}\n{resource link}\n{date}\n\n
/// ```
///
/// with verb, resource type and date lowercased.
///
/// Cross-partition queries are fanned out over the container's partition
/// key ranges and merged client-side, because the gateway refuses to serve
/// cross-partition `TOP` / `ORDER BY` queries directly.
///
/// # Example
///
/// ```no_run
/// use portal_shared::db::cosmos::{CosmosConfig, CosmosStore};
/// use portal_shared::db::DocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = CosmosStore::new(CosmosConfig {
///     endpoint: "https://my-account.documents.azure.com:443/".to_string(),
///     key: std::env::var("COSMOS_DB_KEY")?,
///     database_id: "marketing-portal".to_string(),
///     timeout_seconds: 30,
/// })?;
///
/// store.health_check().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;

use super::catalog::ContainerDefinition;
use super::query::{ParsedQuery, Query};
use super::store::{DocumentStore, StoreError, StoreResult};

/// REST API version sent in `x-ms-version`
pub const API_VERSION: &str = "2018-12-31";

const MAX_ITEM_COUNT: &str = "100";

/// Connection settings for a Cosmos DB account
#[derive(Debug, Clone)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://account.documents.azure.com:443/`
    pub endpoint: String,

    /// Base64 account master key
    pub key: String,

    /// Database id
    pub database_id: String,

    /// Per-request timeout (seconds)
    pub timeout_seconds: u64,
}

/// Cosmos DB implementation of [`DocumentStore`]
#[derive(Clone)]
pub struct CosmosStore {
    client: reqwest::Client,
    endpoint: String,
    key: Vec<u8>,
    database_id: String,
}

impl std::fmt::Debug for CosmosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosStore")
            .field("endpoint", &self.endpoint)
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

/// Builds the URL-encoded master-key authorization token
///
/// # Example
///
/// ```
/// use portal_shared::db::cosmos::authorization_token;
///
/// let token = authorization_token(b"secret", "GET", "dbs", "dbs/portal", "Tue, 01 Oct 2024 10:00:00 GMT");
/// assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
/// ```
pub fn authorization_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    let token = format!("type=master&ver=1.0&sig={}", signature);
    url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
}

/// Current time in the RFC 1123 format Cosmos DB expects
fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// One REST call: what to hit and how to sign it
struct Request<'a> {
    method: Method,
    /// Path after the endpoint, e.g. `dbs/portal/colls/projects/docs`
    path: String,
    resource_type: &'a str,
    /// Resource link used in the signature
    resource_link: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl CosmosStore {
    /// Creates a client; fails when the key is not valid base64
    pub fn new(config: CosmosConfig) -> StoreResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(StoreError::Configuration("Cosmos DB endpoint is empty".to_string()));
        }

        let key = BASE64
            .decode(config.key.trim())
            .map_err(|e| StoreError::Configuration(format!("Cosmos DB key is not valid base64: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key,
            database_id: config.database_id,
        })
    }

    fn collection_link(&self, container: &str) -> String {
        format!("dbs/{}/colls/{}", self.database_id, container)
    }

    fn partition_key_header(partition_key: &str) -> StoreResult<HeaderValue> {
        let encoded = serde_json::to_string(&[partition_key])?;
        HeaderValue::from_str(&encoded)
            .map_err(|e| StoreError::InvalidQuery(format!("Invalid partition key: {}", e)))
    }

    async fn send(&self, request: Request<'_>) -> StoreResult<Response> {
        let date = rfc1123_now();
        let token = authorization_token(
            &self.key,
            request.method.as_str(),
            request.resource_type,
            &request.resource_link,
            &date,
        );

        let url = format!("{}/{}", self.endpoint, request.path);
        tracing::debug!(method = %request.method, %url, "Cosmos DB request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("authorization", token);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(Response { status, headers, body })
    }

    /// Sends a request and maps non-success statuses to errors
    async fn execute(&self, request: Request<'_>) -> StoreResult<Response> {
        let what = request.resource_link.clone();
        let response = self.send(request).await?;

        if response.status.is_success() {
            return Ok(response);
        }

        let message = response
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| response.body.to_string());

        Err(match response.status {
            StatusCode::NOT_FOUND => StoreError::NotFound(what),
            StatusCode::CONFLICT => StoreError::Conflict(what),
            status => {
                tracing::warn!(status = status.as_u16(), %message, "Cosmos DB request failed");
                StoreError::Service {
                    status: status.as_u16(),
                    message,
                }
            }
        })
    }

    fn json_body(value: &impl serde::Serialize) -> StoreResult<Option<Vec<u8>>> {
        Ok(Some(serde_json::to_vec(value)?))
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn write_document(
        &self,
        container: &str,
        partition_key: &str,
        document: Value,
        upsert: bool,
    ) -> StoreResult<Value> {
        let link = self.collection_link(container);
        let mut headers = Self::json_headers();
        headers.insert(
            HeaderName::from_static("x-ms-documentdb-partitionkey"),
            Self::partition_key_header(partition_key)?,
        );
        if upsert {
            headers.insert(
                HeaderName::from_static("x-ms-documentdb-is-upsert"),
                HeaderValue::from_static("True"),
            );
        }

        let response = self
            .execute(Request {
                method: Method::POST,
                path: format!("{}/docs", link),
                resource_type: "docs",
                resource_link: link,
                headers,
                body: Self::json_body(&document)?,
            })
            .await?;

        Ok(response.body)
    }

    /// Lists partition key range ids for a container
    async fn partition_key_ranges(&self, container: &str) -> StoreResult<Vec<String>> {
        let link = self.collection_link(container);
        let response = self
            .execute(Request {
                method: Method::GET,
                path: format!("{}/pkranges", link),
                resource_type: "pkranges",
                resource_link: link,
                headers: HeaderMap::new(),
                body: None,
            })
            .await?;

        Ok(response
            .body
            .get("PartitionKeyRanges")
            .and_then(Value::as_array)
            .map(|ranges| {
                ranges
                    .iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Runs a query to completion, following continuation tokens
    async fn query_pages(
        &self,
        container: &str,
        query: &Query,
        scope: HeaderMap,
    ) -> StoreResult<Vec<Value>> {
        let link = self.collection_link(container);
        let body = serde_json::to_vec(query)?;
        let mut documents = Vec::new();
        let mut continuation: Option<HeaderValue> = None;

        loop {
            let mut headers = scope.clone();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/query+json"));
            headers.insert(
                HeaderName::from_static("x-ms-documentdb-isquery"),
                HeaderValue::from_static("True"),
            );
            headers.insert(
                HeaderName::from_static("x-ms-max-item-count"),
                HeaderValue::from_static(MAX_ITEM_COUNT),
            );
            if let Some(token) = continuation.take() {
                headers.insert(HeaderName::from_static("x-ms-continuation"), token);
            }

            let response = self
                .execute(Request {
                    method: Method::POST,
                    path: format!("{}/docs", link),
                    resource_type: "docs",
                    resource_link: link.clone(),
                    headers,
                    body: Some(body.clone()),
                })
                .await?;

            if let Some(page) = response.body.get("Documents").and_then(Value::as_array) {
                documents.extend(page.iter().cloned());
            }

            match response.headers.get("x-ms-continuation") {
                Some(token) if !token.is_empty() => continuation = Some(token.clone()),
                _ => break,
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for CosmosStore {
    fn database_id(&self) -> &str {
        &self.database_id
    }

    async fn ensure_database(&self) -> StoreResult<()> {
        let result = self
            .execute(Request {
                method: Method::POST,
                path: "dbs".to_string(),
                resource_type: "dbs",
                resource_link: String::new(),
                headers: Self::json_headers(),
                body: Self::json_body(&json!({ "id": self.database_id }))?,
            })
            .await;

        match result {
            Ok(_) => {
                tracing::info!(database = %self.database_id, "Created database");
                Ok(())
            }
            Err(StoreError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn read_container(&self, name: &str) -> StoreResult<Option<ContainerDefinition>> {
        let link = self.collection_link(name);
        let result = self
            .execute(Request {
                method: Method::GET,
                path: link.clone(),
                resource_type: "colls",
                resource_link: link,
                headers: HeaderMap::new(),
                body: None,
            })
            .await;

        match result {
            Ok(response) => Ok(Some(serde_json::from_value(response.body)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition> {
        let db_link = format!("dbs/{}", self.database_id);
        let response = self
            .execute(Request {
                method: Method::POST,
                path: format!("{}/colls", db_link),
                resource_type: "colls",
                resource_link: db_link,
                headers: Self::json_headers(),
                body: Self::json_body(definition)?,
            })
            .await?;

        Ok(serde_json::from_value(response.body)?)
    }

    async fn replace_container(&self, definition: &ContainerDefinition) -> StoreResult<ContainerDefinition> {
        let link = self.collection_link(&definition.id);
        let response = self
            .execute(Request {
                method: Method::PUT,
                path: link.clone(),
                resource_type: "colls",
                resource_link: link,
                headers: Self::json_headers(),
                body: Self::json_body(definition)?,
            })
            .await?;

        Ok(serde_json::from_value(response.body)?)
    }

    async fn create_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value> {
        self.write_document(container, partition_key, document, false).await
    }

    async fn upsert_document(&self, container: &str, partition_key: &str, document: Value) -> StoreResult<Value> {
        self.write_document(container, partition_key, document, true).await
    }

    async fn read_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<Option<Value>> {
        let link = format!("{}/docs/{}", self.collection_link(container), id);
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-documentdb-partitionkey"),
            Self::partition_key_header(partition_key)?,
        );

        let result = self
            .execute(Request {
                method: Method::GET,
                path: link.clone(),
                resource_type: "docs",
                resource_link: link,
                headers,
                body: None,
            })
            .await;

        match result {
            Ok(response) => Ok(Some(response.body)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn replace_document(
        &self,
        container: &str,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> StoreResult<Value> {
        let link = format!("{}/docs/{}", self.collection_link(container), id);
        let mut headers = Self::json_headers();
        headers.insert(
            HeaderName::from_static("x-ms-documentdb-partitionkey"),
            Self::partition_key_header(partition_key)?,
        );

        let response = self
            .execute(Request {
                method: Method::PUT,
                path: link.clone(),
                resource_type: "docs",
                resource_link: link,
                headers,
                body: Self::json_body(&document)?,
            })
            .await?;

        Ok(response.body)
    }

    async fn delete_document(&self, container: &str, partition_key: &str, id: &str) -> StoreResult<bool> {
        let link = format!("{}/docs/{}", self.collection_link(container), id);
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-documentdb-partitionkey"),
            Self::partition_key_header(partition_key)?,
        );

        let result = self
            .execute(Request {
                method: Method::DELETE,
                path: link.clone(),
                resource_type: "docs",
                resource_link: link,
                headers,
                body: None,
            })
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn query_documents(
        &self,
        container: &str,
        query: &Query,
        partition_key: Option<&str>,
    ) -> StoreResult<Vec<Value>> {
        if let Some(pk) = partition_key {
            let mut scope = HeaderMap::new();
            scope.insert(
                HeaderName::from_static("x-ms-documentdb-partitionkey"),
                Self::partition_key_header(pk)?,
            );
            return self.query_pages(container, query, scope).await;
        }

        let mut rows = Vec::new();
        for range in self.partition_key_ranges(container).await? {
            let mut scope = HeaderMap::new();
            scope.insert(
                HeaderName::from_static("x-ms-documentdb-query-enablecrosspartition"),
                HeaderValue::from_static("True"),
            );
            scope.insert(
                HeaderName::from_static("x-ms-documentdb-partitionkeyrangeid"),
                HeaderValue::from_str(&range)
                    .map_err(|e| StoreError::InvalidQuery(format!("Invalid range id: {}", e)))?,
            );
            rows.extend(self.query_pages(container, query, scope).await?);
        }

        // Each range applied TOP / ORDER BY locally; re-apply across ranges
        match ParsedQuery::parse(query) {
            Ok(parsed) => Ok(parsed.apply(rows.iter())),
            Err(_) => Ok(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_token_is_url_encoded() {
        let token = authorization_token(
            b"key",
            "GET",
            "dbs",
            "dbs/portal",
            "Thu, 27 Apr 2017 00:51:12 GMT",
        );

        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!token.contains('='));
        assert!(!token.contains('&'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_authorization_token_depends_on_inputs() {
        let date = "Thu, 27 Apr 2017 00:51:12 GMT";
        let a = authorization_token(b"key", "GET", "docs", "dbs/d/colls/c/docs/1", date);
        let b = authorization_token(b"key", "GET", "docs", "dbs/d/colls/c/docs/2", date);
        let c = authorization_token(b"other", "GET", "docs", "dbs/d/colls/c/docs/1", date);

        assert_ne!(a, b);
        assert_ne!(a, c);

        // Verb, resource type and date are case-insensitive in the signature
        let upper = authorization_token(b"key", "get", "DOCS", "dbs/d/colls/c/docs/1", &date.to_uppercase());
        assert_eq!(a, upper);
    }

    #[test]
    fn test_authorization_signature_matches_manual_hmac() {
        let key = b"0123456789abcdef";
        let date = "Mon, 07 Oct 2024 12:00:00 GMT";
        let token = authorization_token(key, "POST", "docs", "dbs/d/colls/c", date);

        let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
        mac.update(b"post\ndocs\ndbs/d/colls/c\nmon, 07 oct 2024 12:00:00 gmt\n\n");
        let expected_sig = BASE64.encode(mac.finalize().into_bytes());
        let expected: String = url::form_urlencoded::byte_serialize(
            format!("type=master&ver=1.0&sig={}", expected_sig).as_bytes(),
        )
        .collect();

        assert_eq!(token, expected);
    }

    #[test]
    fn test_new_rejects_invalid_key() {
        let result = CosmosStore::new(CosmosConfig {
            endpoint: "https://example.documents.azure.com:443/".to_string(),
            key: "not base64 !!".to_string(),
            database_id: "portal".to_string(),
            timeout_seconds: 5,
        });
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn test_new_trims_endpoint() {
        let store = CosmosStore::new(CosmosConfig {
            endpoint: "https://example.documents.azure.com:443/".to_string(),
            key: BASE64.encode(b"secret"),
            database_id: "portal".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();

        assert_eq!(store.endpoint, "https://example.documents.azure.com:443");
        assert_eq!(store.collection_link("projects"), "dbs/portal/colls/projects");
    }

    #[test]
    fn test_rfc1123_format() {
        let date = rfc1123_now();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.split(' ').count(), 6);
    }
}
