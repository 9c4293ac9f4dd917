//! Request/response access to the server manager
//!
//! The sync core only needs two reads: the current status and the last N log
//! entries. [`StatusApi`] is the seam the bootstrap loader depends on;
//! [`HttpApi`] is the `reqwest` implementation used by the binaries.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{ErrorResponse, SyncError, SyncResult};
use crate::models::{LogEntry, Status};

/// Reads the sync core bootstraps from
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Fetch the current, fully populated status
    async fn get_status(&self) -> SyncResult<Status>;

    /// Fetch at most `count` log entries, newest first
    async fn get_logs(&self, count: usize) -> SyncResult<Vec<LogEntry>>;
}

/// HTTP client for the server manager REST API
#[derive(Clone)]
pub struct HttpApi {
    http: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for an API base such as `http://host:8080/api/v1`
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build a client from configuration
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| SyncError::Http {
                path: config.api_base(),
                source,
            })?;
        Ok(Self::new(config.api_base(), http))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T>(&self, path: &str) -> SyncResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| SyncError::Http {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| SyncError::Http {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(envelope) => SyncError::Server {
                    path: path.to_string(),
                    response: envelope,
                },
                Err(_) => SyncError::UnexpectedStatus {
                    path: path.to_string(),
                    status: status.as_u16(),
                },
            });
        }

        decode_body(path, &body)
    }
}

#[async_trait]
impl StatusApi for HttpApi {
    async fn get_status(&self) -> SyncResult<Status> {
        self.get_json("/status").await
    }

    async fn get_logs(&self, count: usize) -> SyncResult<Vec<LogEntry>> {
        let mut logs: Vec<LogEntry> = self.get_json(&format!("/logs/{}", count)).await?;
        logs.truncate(count);
        Ok(logs)
    }
}

/// Decode a success body, mapping failures to [`SyncError::Decode`]
fn decode_body<T: DeserializeOwned>(path: &str, body: &[u8]) -> SyncResult<T> {
    serde_json::from_slice(body).map_err(|err| SyncError::Decode {
        path: path.to_string(),
        details: err.to_string(),
    })
}
