use super::http::{HttpTransport, Transport};
use super::source::SubdomainSource;
use super::{CrtShClient, HackerTargetClient, VirusTotalClient};
use crate::config::Settings;
use crate::credentials::resolve_api_key;
use crate::error::ReconResult;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Coordinates subdomain enumeration across every configured source
pub struct ReconManager {
    sources: Vec<Box<dyn SubdomainSource>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SubdomainEnumerationResult {
    /// Union of all sources, sorted
    pub subdomains: Vec<String>,
    pub sources: HashMap<String, Vec<String>>, // source -> domains found
    pub failures: Vec<SourceFailure>,
}

impl ReconManager {
    /// Create a manager with crt.sh, HackerTarget and, when a key resolves, VirusTotal
    pub fn new(settings: &Settings) -> ReconResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_settings(settings)?);
        Self::with_transport(transport, settings)
    }

    /// Create the default set of sources over a shared transport
    pub fn with_transport(transport: Arc<dyn Transport>, settings: &Settings) -> ReconResult<Self> {
        let mut sources: Vec<Box<dyn SubdomainSource>> = vec![
            Box::new(CrtShClient::with_transport(transport.clone(), settings)),
            Box::new(HackerTargetClient::with_transport(
                transport.clone(),
                settings,
            )?),
        ];

        match resolve_api_key(
            settings.virustotal_api_key.as_deref(),
            &settings.virustotal_api_key_env,
        ) {
            Ok(api_key) => sources.push(Box::new(VirusTotalClient::with_transport(
                transport, api_key, settings,
            ))),
            Err(e) => {
                tracing::info!("VirusTotal not configured: {}", e);
            }
        }

        Ok(Self::from_sources(sources))
    }

    pub fn from_sources(sources: Vec<Box<dyn SubdomainSource>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Query every source in order; a failing source does not stop the others
    pub async fn enumerate_subdomains(&mut self, target: &str) -> SubdomainEnumerationResult {
        let mut all_subdomains = BTreeSet::new();
        let mut sources = HashMap::new();
        let mut failures = Vec::new();

        for source in self.sources.iter_mut() {
            let name = source.name();
            tracing::info!("Enumerating subdomains for {} using {}", target, name);

            match source.fetch_subdomains(target).await {
                Ok(found) => {
                    tracing::info!("Found {} domains from {}", found.len(), name);
                    let mut found: Vec<String> = found.into_iter().collect();
                    found.sort();
                    all_subdomains.extend(found.iter().cloned());
                    sources.insert(name.to_string(), found);
                }
                Err(e) => {
                    tracing::warn!("{} enumeration failed for {}: {}", name, target, e);
                    failures.push(SourceFailure {
                        source: name.to_string(),
                        code: e.code(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Subdomain enumeration complete for {}: {} unique domains from {} sources",
            target,
            all_subdomains.len(),
            sources.len()
        );

        SubdomainEnumerationResult {
            subdomains: all_subdomains.into_iter().collect(),
            sources,
            failures,
        }
    }
}
