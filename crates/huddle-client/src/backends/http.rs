//! HTTP backend speaking the chat server's JSON API.

use crate::error::ClientError;
use crate::traits::ChatBackend;
use crate::types::{Agent, SendMessageRequest, SendMessageResponse, WireMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Default API root of a locally running chat server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for an HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// API root, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A backend reached over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Create a new HTTP backend.
    pub fn new(config: HttpBackendConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// API root in use, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check the status and decode the JSON body.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build an API error, preferring the body's `message` field.
fn api_error(status: u16, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => "unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ClientError::Api { status, message }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, ClientError> {
        let url = self.endpoint("agents");
        tracing::debug!(url = %url, "fetching agents");
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn fetch_messages(&self, session_id: &str) -> Result<Vec<WireMessage>, ClientError> {
        let url = self.endpoint("messages");
        tracing::debug!(url = %url, session = %session_id, "fetching messages");
        let response = self
            .client
            .get(&url)
            .query(&[("sessionId", session_id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ClientError> {
        let url = self.endpoint("messages");
        tracing::debug!(url = %url, session = %request.session_id, "sending message");
        let response = self.client.post(&url).json(&request).send().await?;
        Self::decode(response).await
    }
}
