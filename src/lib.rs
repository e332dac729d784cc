//! Passive reconnaissance clients for crt.sh, HackerTarget and VirusTotal.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod services;
pub mod utils;

pub use config::Settings;
pub use credentials::{resolve_api_key, ApiKey};
pub use error::{ReconError, ReconResult};
pub use services::external::{
    CrtShClient, HackerTargetClient, QueryUrlBuilder, ReconManager, SubdomainSource,
    VirusTotalClient,
};
