use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for the indexer endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Hash mappings older than this are purged at startup.
    #[serde(default = "default_purge_after_days")]
    pub purge_after_days: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            purge_after_days: default_purge_after_days(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("mulearr.db")
}

fn default_purge_after_days() -> u32 {
    90
}

/// Backend bridge configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend bridge URL (e.g., "http://localhost:4712")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Search gateway tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Minimum time between two backend searches.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// How long merged results stay cached.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Upper bound on `limit` and the value advertised in caps.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            max_results: default_max_results(),
        }
    }
}

fn default_min_interval_ms() -> u64 {
    10_000
}

fn default_cache_ttl_ms() -> u64 {
    600_000
}

fn default_max_results() -> u32 {
    100
}

/// Download categories and fallbacks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Category id used when a requested label is unknown.
    #[serde(default)]
    pub default_category_id: u32,
    /// Reported save path for content without a category.
    #[serde(default = "default_save_path")]
    pub save_path: String,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            default_category_id: 0,
            save_path: default_save_path(),
            categories: Vec::new(),
        }
    }
}

fn default_save_path() -> String {
    "/incoming".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryConfig {
    pub id: u32,
    pub label: String,
    #[serde(default)]
    pub path: String,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub downloads: DownloadsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            backend: config.backend.clone(),
            search: config.search.clone(),
            downloads: config.downloads.clone(),
        }
    }
}
