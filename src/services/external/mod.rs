pub mod crtsh;
pub mod hackertarget;
pub mod http;
pub mod manager;
pub mod query;
pub mod source;
pub mod store;
pub mod virustotal;

#[cfg(test)]
pub mod mock;

pub use crtsh::{CertificateEntry, CrtShClient, CrtShQuery, CrtShResults};
pub use hackertarget::{
    AsLookup, AsnInfo, DnsRecordSet, HackerTargetClient, HackerTargetEndpoint, HackerTargetQuery,
    HackerTargetResults, HostMapping, HostSearch,
};
pub use http::{Headers, HttpTransport, Transport, TransportError};
pub use manager::{ReconManager, SourceFailure, SubdomainEnumerationResult};
pub use query::{QueryParams, QueryUrlBuilder};
pub use source::SubdomainSource;
pub use store::TargetStore;
pub use virustotal::{VirusTotalClient, VirusTotalEndpoint, VirusTotalQuery, VirusTotalResults};
