use super::http::{Headers, HttpTransport, Transport};
use super::query::{build_url, params, QueryParams, QueryUrlBuilder};
use super::source::SubdomainSource;
use super::store::TargetStore;
use crate::config::Settings;
use crate::credentials::{resolve_api_key, ApiKey};
use crate::error::{ReconError, ReconResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-apikey";

/// VirusTotal API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirusTotalEndpoint {
    Subdomains,
}

impl VirusTotalEndpoint {
    /// Endpoint path with the target substituted in
    pub fn path(&self, target: &str) -> String {
        match self {
            VirusTotalEndpoint::Subdomains => format!("domains/{}/subdomains", target),
        }
    }
}

/// Addresses one VirusTotal request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirusTotalQuery {
    pub target: String,
    pub endpoint: VirusTotalEndpoint,
    pub params: QueryParams,
}

#[derive(Debug, Deserialize)]
pub struct VirusTotalObject {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct VirusTotalListResponse<T> {
    pub data: Vec<T>,
}

/// Results accumulated by a [`VirusTotalClient`]
#[derive(Debug, Default)]
pub struct VirusTotalResults {
    /// Full decoded payload of the latest response per target
    pub payloads: TargetStore<serde_json::Value>,
    pub subdomains: TargetStore<HashSet<String>>,
}

/// Extract the `id` of every element of the `data` array
pub fn parse_subdomains(payload: &serde_json::Value) -> ReconResult<HashSet<String>> {
    let response: VirusTotalListResponse<VirusTotalObject> =
        VirusTotalListResponse::deserialize(payload).map_err(|e| {
            ReconError::parse(format!(
                "Failed to parse VirusTotal subdomains response: {}",
                e
            ))
        })?;

    Ok(response.data.into_iter().map(|object| object.id).collect())
}

/// VirusTotal API client; construction requires an API key
pub struct VirusTotalClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: ApiKey,
    default_limit: u32,
    results: VirusTotalResults,
}

impl std::fmt::Debug for VirusTotalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirusTotalClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

impl VirusTotalClient {
    /// Create a VirusTotal client, resolving the API key from settings or the environment
    pub fn new(settings: &Settings) -> ReconResult<Self> {
        let api_key = resolve_api_key(
            settings.virustotal_api_key.as_deref(),
            &settings.virustotal_api_key_env,
        )?;
        let transport = HttpTransport::from_settings(settings)?;

        Ok(Self::with_transport(Arc::new(transport), api_key, settings))
    }

    /// Create a VirusTotal client with an already resolved key and transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        api_key: ApiKey,
        settings: &Settings,
    ) -> Self {
        Self {
            transport,
            base_url: settings.virustotal_url.clone(),
            api_key,
            default_limit: settings.virustotal_subdomain_limit,
            results: VirusTotalResults::default(),
        }
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Headers required by the VirusTotal API
    pub fn headers(&self) -> Headers {
        Headers::from([
            ("accept".to_string(), "application/json".to_string()),
            (API_KEY_HEADER.to_string(), self.api_key.expose().to_string()),
        ])
    }

    /// Query URL for the subdomains relationship of `target`
    pub fn query_url(&self, target: &str, limit: u32) -> String {
        self.build_query_url(&VirusTotalQuery {
            target: target.to_string(),
            endpoint: VirusTotalEndpoint::Subdomains,
            params: params([("limit", limit)]),
        })
    }

    /// Fetch up to `limit` subdomains of `target`
    pub async fn fetch_subdomains_with_limit(
        &mut self,
        target: &str,
        limit: u32,
    ) -> ReconResult<HashSet<String>> {
        let url = self.query_url(target, limit);

        tracing::debug!("Querying VirusTotal subdomains: {}", target);

        let body = match self.transport.fetch(&url, &self.headers()).await {
            Ok(body) => body,
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("VirusTotal rejected the API key: {}", e);
                return Err(ReconError::api_key(
                    "Unauthorized. Check the API key settings and try again.",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ReconError::parse(format!("Failed to parse VirusTotal response: {}", e))
        })?;
        let subdomains = parse_subdomains(&payload)?;

        tracing::info!(
            "Found {} subdomains for {} from VirusTotal",
            subdomains.len(),
            target
        );

        self.results.payloads.replace(target, payload);
        self.results.subdomains.replace(target, subdomains.clone());

        Ok(subdomains)
    }

    pub fn results(&self) -> &VirusTotalResults {
        &self.results
    }

    pub fn payload(&self, target: &str) -> Option<&serde_json::Value> {
        self.results.payloads.get(target)
    }

    pub fn subdomains(&self, target: &str) -> Option<&HashSet<String>> {
        self.results.subdomains.get(target)
    }
}

impl QueryUrlBuilder for VirusTotalClient {
    type Query = VirusTotalQuery;

    fn build_query_url(&self, query: &VirusTotalQuery) -> String {
        build_url(
            &self.base_url,
            &query.endpoint.path(&query.target),
            &query.params,
        )
    }
}

#[async_trait]
impl SubdomainSource for VirusTotalClient {
    fn name(&self) -> &'static str {
        "virustotal"
    }

    async fn fetch_subdomains(&mut self, target: &str) -> ReconResult<HashSet<String>> {
        let limit = self.default_limit;
        self.fetch_subdomains_with_limit(target, limit).await
    }
}
