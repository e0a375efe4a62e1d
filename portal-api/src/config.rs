/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a
/// `.env` file when present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 7071)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `STORAGE_BACKEND`: `cosmos` or `memory` (default: cosmos)
/// - `COSMOS_DB_ENDPOINT`: Cosmos DB account endpoint (required for cosmos)
/// - `COSMOS_DB_KEY`: Cosmos DB master key (required for cosmos)
/// - `COSMOS_DB_DATABASE_ID`: Database id (default: marketing-portal)
/// - `COSMOS_DB_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
/// - `INIT_DB_ON_STARTUP`: Create database and containers at boot (default: false)
/// - `NEXTAUTH_SECRET`: Session token signing secret, at least 32 characters (required)
/// - `RUST_LOG`: Log filter (default: portal_api=debug,tower_http=debug)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
///
/// # Example
///
/// ```no_run
/// use portal_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use portal_shared::auth::jwt::MIN_SECRET_LENGTH;
use portal_shared::db::cosmos::CosmosConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Document store configuration
    pub cosmos: CosmosSettings,

    /// Session token configuration
    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,

    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Cosmos,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosmos" => Ok(StorageBackend::Cosmos),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND must be 'cosmos' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosSettings {
    pub backend: StorageBackend,

    /// Account endpoint (empty for the memory backend)
    pub endpoint: String,

    /// Master key (never serialized)
    #[serde(skip_serializing)]
    pub key: String,

    pub database_id: String,

    pub timeout_seconds: u64,

    /// Create database and containers at startup
    pub init_on_startup: bool,
}

impl CosmosSettings {
    pub fn client_config(&self) -> CosmosConfig {
        CosmosConfig {
            endpoint: self.endpoint.clone(),
            key: self.key.clone(),
            database_id: self.database_id.clone(),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the front end's auth provider
    ///
    /// IMPORTANT: at least 32 characters. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,
}

fn env_bool(name: &str) -> anyhow::Result<bool> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got '{}'", name, other),
        },
    }
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(|o| o.to_string())
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "7071".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));
        let production = env_bool("PRODUCTION")?;
        let log_format = env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .parse::<LogFormat>()?;

        let backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "cosmos".to_string())
            .parse::<StorageBackend>()?;

        let (endpoint, key) = match backend {
            StorageBackend::Cosmos => (
                env::var("COSMOS_DB_ENDPOINT")
                    .map_err(|_| anyhow::anyhow!("COSMOS_DB_ENDPOINT environment variable is required"))?,
                env::var("COSMOS_DB_KEY")
                    .map_err(|_| anyhow::anyhow!("COSMOS_DB_KEY environment variable is required"))?,
            ),
            StorageBackend::Memory => (
                env::var("COSMOS_DB_ENDPOINT").unwrap_or_default(),
                env::var("COSMOS_DB_KEY").unwrap_or_default(),
            ),
        };

        let database_id = env::var("COSMOS_DB_DATABASE_ID").unwrap_or_else(|_| "marketing-portal".to_string());
        let timeout_seconds = env::var("COSMOS_DB_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;
        let init_on_startup = env_bool("INIT_DB_ON_STARTUP")?;

        let secret = env::var("NEXTAUTH_SECRET")
            .map_err(|_| anyhow::anyhow!("NEXTAUTH_SECRET environment variable is required"))?;

        if secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("NEXTAUTH_SECRET must be at least {} characters long", MIN_SECRET_LENGTH);
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
                log_format,
            },
            cosmos: CosmosSettings {
                backend,
                endpoint,
                key,
                database_id,
                timeout_seconds,
                init_on_startup,
            },
            auth: AuthConfig { secret },
        })
    }

    /// Configuration for tests and local runs: memory store, any origin
    pub fn for_memory(secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 7071,
                cors_origins: vec!["*".to_string()],
                production: false,
                log_format: LogFormat::Pretty,
            },
            cosmos: CosmosSettings {
                backend: StorageBackend::Memory,
                endpoint: String::new(),
                key: String::new(),
                database_id: "marketing-portal".to_string(),
                timeout_seconds: 30,
                init_on_startup: true,
            },
            auth: AuthConfig { secret: secret.into() },
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
