use super::http::{Headers, HttpTransport, Transport};
use super::query::{build_url, params, QueryUrlBuilder};
use super::source::SubdomainSource;
use super::store::TargetStore;
use crate::config::Settings;
use crate::error::{ReconError, ReconResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::sync::Arc;

/// Characters crt.sh treats as wildcards in a search term
const WILDCARD_MARKERS: [char; 2] = ['*', '%'];
const WILDCARD_LABEL: &str = "*.";

/// Split the newline-delimited `name_value` field into hostnames
fn deserialize_newline_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(s.split('\n')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

/// One certificate row returned by crt.sh
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CertificateEntry {
    pub id: u64,
    pub issuer_ca_id: u64,
    pub issuer_name: String,
    pub common_name: Option<String>,
    #[serde(rename = "name_value", deserialize_with = "deserialize_newline_separated")]
    pub alternate_names: Vec<String>,
    pub serial_number: String,
    pub not_before: NaiveDateTime,
    pub not_after: NaiveDateTime,
    #[serde(default)]
    pub entry_timestamp: Option<NaiveDateTime>,
}

/// Parse a crt.sh JSON response. An empty body means no certificates.
pub fn parse_certificates(body: &str) -> ReconResult<Vec<CertificateEntry>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(body)
        .map_err(|e| ReconError::parse(format!("Failed to parse crt.sh response: {}", e)))
}

/// Search term with a wildcard label prepended when requested and not already present
pub fn search_term(target: &str, wildcard: bool) -> String {
    if wildcard && !target.contains(&WILDCARD_MARKERS[..]) {
        format!("{}{}", WILDCARD_LABEL, target)
    } else {
        target.to_string()
    }
}

/// Addresses one crt.sh search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrtShQuery {
    pub target: String,
    pub wildcard: bool,
    pub include_expired: bool,
}

/// Results accumulated by a [`CrtShClient`]
#[derive(Debug, Default)]
pub struct CrtShResults {
    pub certificates: TargetStore<Vec<CertificateEntry>>,
    pub subdomains: TargetStore<HashSet<String>>,
}

/// Certificate Transparency log client for subdomain enumeration
pub struct CrtShClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    wildcard: bool,
    include_expired: bool,
    results: CrtShResults,
}

impl CrtShClient {
    /// Create a crt.sh client with an HTTP transport built from settings
    pub fn new(settings: &Settings) -> ReconResult<Self> {
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::with_transport(Arc::new(transport), settings))
    }

    /// Create a crt.sh client on top of an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self {
            transport,
            base_url: settings.crtsh_url.clone(),
            wildcard: settings.crtsh_wildcard,
            include_expired: settings.crtsh_include_expired,
            results: CrtShResults::default(),
        }
    }

    pub fn with_wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_include_expired(mut self, include_expired: bool) -> Self {
        self.include_expired = include_expired;
        self
    }

    pub fn wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn include_expired(&self) -> bool {
        self.include_expired
    }

    /// Query URL for `target` using this client's wildcard and expiry flags
    pub fn query_url(&self, target: &str) -> String {
        self.build_query_url(&CrtShQuery {
            target: target.to_string(),
            wildcard: self.wildcard,
            include_expired: self.include_expired,
        })
    }

    /// Fetch all certificates crt.sh knows for `target`
    pub async fn fetch_certificates(&mut self, target: &str) -> ReconResult<Vec<CertificateEntry>> {
        let url = self.query_url(target);

        tracing::debug!("Querying crt.sh: {}", url);

        let body = self.transport.fetch(&url, &Headers::new()).await?;
        let entries = parse_certificates(&body)?;

        let subdomains: HashSet<String> = entries
            .iter()
            .filter_map(|entry| entry.common_name.clone())
            .collect();

        tracing::info!(
            "Found {} certificates and {} common names for {} on crt.sh",
            entries.len(),
            subdomains.len(),
            target
        );

        self.results.certificates.replace(target, entries.clone());
        self.results.subdomains.replace(target, subdomains);

        Ok(entries)
    }

    pub fn results(&self) -> &CrtShResults {
        &self.results
    }

    pub fn certificates(&self, target: &str) -> Option<&Vec<CertificateEntry>> {
        self.results.certificates.get(target)
    }

    pub fn subdomains(&self, target: &str) -> Option<&HashSet<String>> {
        self.results.subdomains.get(target)
    }
}

impl QueryUrlBuilder for CrtShClient {
    type Query = CrtShQuery;

    fn build_query_url(&self, query: &CrtShQuery) -> String {
        let mut query_params = params([
            ("q", search_term(&query.target, query.wildcard)),
            ("output", "json".to_string()),
        ]);

        if !query.include_expired {
            query_params.push(("exclude".to_string(), "expired".to_string()));
        }

        build_url(&self.base_url, "", &query_params)
    }
}

#[async_trait]
impl SubdomainSource for CrtShClient {
    fn name(&self) -> &'static str {
        "crt.sh"
    }

    async fn fetch_subdomains(&mut self, target: &str) -> ReconResult<HashSet<String>> {
        self.fetch_certificates(target).await?;
        Ok(self.subdomains(target).cloned().unwrap_or_default())
    }
}
