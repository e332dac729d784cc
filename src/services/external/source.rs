use crate::error::ReconResult;
use async_trait::async_trait;
use std::collections::HashSet;

/// A service that can list known subdomains for a target
#[async_trait]
pub trait SubdomainSource: Send {
    /// Short identifier used in aggregated results
    fn name(&self) -> &'static str;

    async fn fetch_subdomains(&mut self, target: &str) -> ReconResult<HashSet<String>>;
}
