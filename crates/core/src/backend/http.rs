//! HTTP bridge client for the ed2k backend.
//!
//! Talks JSON to a small sidecar that fronts the daemon's remote-control
//! protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::BackendConfig;

use super::{BackendError, DownloadRecord, MuleBackend, SearchResponse, SharedFileRecord};

/// Backend client over the HTTP bridge.
pub struct HttpBackendClient {
    client: Client,
    config: BackendConfig,
    /// Last known connection state.
    connected: RwLock<bool>,
}

#[derive(Debug, Serialize)]
struct AddDownloadBody<'a> {
    link: &'a str,
    category: u32,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    connected: bool,
}

impl HttpBackendClient {
    /// Create a new bridge client.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            connected: RwLock::new(false),
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url(), endpoint);
        self.client.request(method, url)
    }

    /// Ask the bridge whether the daemon is connected and remember the answer.
    pub async fn probe(&self) -> bool {
        let connected = match self.send::<StatusResponse>(self.request(Method::GET, "/status")).await
        {
            Ok(status) => status.connected,
            Err(e) => {
                debug!(error = %e, "Backend status probe failed");
                false
            }
        };
        *self.connected.write().await = connected;
        connected
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = if e.is_timeout() {
                    BackendError::Timeout
                } else if e.is_connect() {
                    BackendError::ConnectionFailed(e.to_string())
                } else {
                    BackendError::ApiError(e.to_string())
                };
                if matches!(err, BackendError::ConnectionFailed(_)) {
                    *self.connected.write().await = false;
                }
                return Err(err);
            }
        };

        let status = response.status();
        if status.as_u16() == 503 {
            *self.connected.write().await = false;
            return Err(BackendError::NotConnected);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl MuleBackend for HttpBackendClient {
    fn name(&self) -> &str {
        "http-bridge"
    }

    async fn is_connected(&self) -> bool {
        if *self.connected.read().await {
            return true;
        }
        self.probe().await
    }

    async fn list_active_downloads(&self) -> Result<Vec<DownloadRecord>, BackendError> {
        self.send(self.request(Method::GET, "/downloads")).await
    }

    async fn list_shared_files(&self) -> Result<Vec<SharedFileRecord>, BackendError> {
        self.send(self.request(Method::GET, "/shared")).await
    }

    async fn add_native_link(&self, link: &str, category_id: u32) -> Result<bool, BackendError> {
        let body = AddDownloadBody {
            link,
            category: category_id,
        };
        let ack: AckResponse = self
            .send(self.request(Method::POST, "/downloads").json(&body))
            .await?;
        if !ack.success {
            warn!(link = link, "Backend refused download");
        }
        Ok(ack.success)
    }

    async fn cancel(&self, native_hash: &str) -> Result<bool, BackendError> {
        let endpoint = format!("/downloads/{}", urlencoding::encode(native_hash));
        let ack: AckResponse = self.send(self.request(Method::DELETE, &endpoint)).await?;
        Ok(ack.success)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, BackendError> {
        debug!(query = query, "Searching backend");
        self.send(
            self.request(Method::GET, "/search")
                .query(&[("q", query)]),
        )
        .await
    }
}
