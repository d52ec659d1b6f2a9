//! paraworld-client: HTTP client for the Parallel World backend
//!
//! This crate provides the transport layer used by the rest of the
//! workspace: a thin wrapper around reqwest with a fixed request timeout,
//! response envelope decoding, 401 detection, and session token handling.

use std::sync::Arc;
use std::time::Duration;

use paraworld_core::{BackendConfig, ClientError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Default timeout for backend API calls (30 seconds).
/// Long enough for slow links, short enough to avoid perpetual spinners.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for backend client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Standard response envelope returned by every backend endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,

    #[serde(default)]
    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the envelope into its payload.
    ///
    /// A non-success envelope surfaces the server's message verbatim; a
    /// success envelope without a payload is a contract violation.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(ClientError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| "unspecified backend error".to_string()),
            });
        }
        self.data.ok_or_else(|| {
            ClientError::Parse("missing data field in successful response".to_string())
        })
    }
}

/// High-level backend client with session token handling
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    session_token: Arc<RwLock<String>>,
}

impl BackendClient {
    /// Create a new backend client from configuration
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            ClientError::Network {
                url: config.base_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: Arc::new(RwLock::new(config.session_token)),
        })
    }

    /// Backend base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the session token (e.g. after sign-in)
    pub async fn set_session_token(&self, token: impl Into<String>) {
        let mut lock = self.session_token.write().await;
        *lock = token.into();
    }

    /// Clear the session token (e.g. after sign-out or a 401)
    pub async fn clear_session_token(&self) {
        let mut lock = self.session_token.write().await;
        lock.clear();
    }

    /// Check if the backend is reachable (any HTTP response counts)
    pub async fn is_online(&self) -> bool {
        let request = self.http.get(&self.base_url);
        matches!(
            tokio::time::timeout(REQUEST_TIMEOUT, request.send()).await,
            Ok(Ok(_))
        )
    }

    /// GET an endpoint and decode its envelope payload
    pub async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint_url(path);
        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.execute(request, &url).await
    }

    /// POST a JSON body to an endpoint and decode its envelope payload
    pub async fn post_envelope<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint_url(path);
        let request = self.http.post(&url).json(body);
        self.execute(request, &url).await
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request under the timeout and decode the response envelope
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T> {
        let request = match self.bearer_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| ClientError::Timeout {
                seconds: REQUEST_TIMEOUT.as_secs(),
            })?
            .map_err(|e| ClientError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend returned 401 for {}", url);
            return Err(ClientError::Unauthorized);
        }

        let text = response.text().await.map_err(|e| ClientError::Network {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Non-2xx without a decodable envelope is a transport failure
                if !status.is_success() {
                    return Err(ClientError::Network {
                        url: url.to_string(),
                        message: format!("HTTP {}", status),
                    });
                }
                return Err(ClientError::Parse(e.to_string()));
            }
        };

        envelope.into_data()
    }

    async fn bearer_token(&self) -> Option<String> {
        let token = self.session_token.read().await;
        if token.is_empty() {
            None
        } else {
            Some(token.clone())
        }
    }
}
