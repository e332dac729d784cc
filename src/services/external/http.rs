use crate::config::Settings;
use crate::error::{ReconError, ReconResult};
use crate::utils::random_user_agent;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

/// Request headers as plain name/value pairs
pub type Headers = HashMap<String, String>;

/// Errors raised while talking to a remote service
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status} unauthorized")]
    Unauthorized { status: u16 },

    #[error("HTTP {status} error: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn code(&self) -> u16 {
        match self {
            TransportError::Unauthorized { .. } => 10,
            TransportError::Status { .. } => 11,
            TransportError::Request(_) => 12,
            TransportError::InvalidHeader(_) => 13,
            TransportError::Decode(_) => 14,
        }
    }

    /// Whether the service rejected the request credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Unauthorized { .. })
    }
}

/// Fetches a URL and returns the decoded response body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, headers: &Headers) -> Result<String, TransportError>;
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: Client,
    user_agent: Option<String>,
    encoding: String,
}

impl HttpTransport {
    /// Create a transport from explicit options
    pub fn new(
        timeout: Duration,
        user_agent: Option<String>,
        encoding: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            user_agent,
            encoding: encoding.into(),
        })
    }

    /// Create a transport using the timeout, user agent and encoding from settings
    pub fn from_settings(settings: &Settings) -> ReconResult<Self> {
        let timeout = Duration::try_from_secs_f64(settings.http_timeout_seconds).map_err(|e| {
            ReconError::configuration(format!(
                "Invalid http_timeout_seconds {}: {}",
                settings.http_timeout_seconds, e
            ))
        })?;

        Ok(Self::new(
            timeout,
            settings.user_agent.clone(),
            settings.encoding.clone(),
        )?)
    }

    /// User agent for the next request: the configured one or a random pick
    fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string())
    }

    fn build_headers(&self, headers: &Headers) -> Result<HeaderMap, TransportError> {
        let mut header_map = HeaderMap::new();

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidHeader(format!("{}: {}", name, e)))?;
            // Values may carry secrets, keep them out of the error message
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidHeader(format!("{}: {}", name, e)))?;
            header_map.insert(name, value);
        }

        let user_agent = HeaderValue::from_str(&self.user_agent())
            .map_err(|e| TransportError::InvalidHeader(format!("user-agent: {}", e)))?;
        header_map.insert(USER_AGENT, user_agent);

        Ok(header_map)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, headers: &Headers) -> Result<String, TransportError> {
        let header_map = self.build_headers(headers)?;

        let response = self.client.get(url).headers(header_map).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text_with_charset(&self.encoding)
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
