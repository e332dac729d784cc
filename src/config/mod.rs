use crate::error::ReconError;
use serde::Deserialize;
use std::sync::{Mutex, OnceLock};


pub const DEFAULT_CRTSH_URL: &str = "https://crt.sh";
pub const DEFAULT_HACKERTARGET_URL: &str = "https://api.hackertarget.com";
pub const DEFAULT_VIRUSTOTAL_URL: &str = "https://www.virustotal.com/api/v3";
pub const DEFAULT_VIRUSTOTAL_API_KEY_ENV: &str = "VIRUSTOTAL_API_KEY";
pub const DEFAULT_VIRUSTOTAL_SUBDOMAIN_LIMIT: u32 = 1000;

/// Library settings with environment variable support
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // HTTP
    pub user_agent: Option<String>,
    pub encoding: String,
    pub http_timeout_seconds: f64,

    // crt.sh
    pub crtsh_url: String,
    pub crtsh_wildcard: bool,
    pub crtsh_include_expired: bool,

    // HackerTarget
    pub hackertarget_url: String,

    // VirusTotal
    pub virustotal_url: String,
    /// Literal key or path to an env file holding it
    pub virustotal_api_key: Option<String>,
    pub virustotal_api_key_env: String,
    pub virustotal_subdomain_limit: u32,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Settings {
    /// Create new settings instance from environment variables and .env file
    pub fn new() -> Result<Self, ReconError> {
        Self::new_with_env_file(true)
    }

    /// Create new settings instance with optional .env file loading
    pub fn new_with_env_file(load_env_file: bool) -> Result<Self, ReconError> {
        // Tests mutate process env; serialize reads of it
        static SETTINGS_BUILD_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let build_mutex = SETTINGS_BUILD_MUTEX.get_or_init(|| Mutex::new(()));
        let _guard = build_mutex
            .lock()
            .map_err(|_| ReconError::configuration("settings build mutex poisoned"))?;

        if load_env_file {
            dotenvy::dotenv().ok();
        }

        let mut builder = config::Config::builder()
            // HTTP defaults
            .set_default("user_agent", None::<String>)?
            .set_default("encoding", "utf-8")?
            .set_default("http_timeout_seconds", 30.0)?
            // crt.sh defaults
            .set_default("crtsh_url", DEFAULT_CRTSH_URL)?
            .set_default("crtsh_wildcard", true)?
            .set_default("crtsh_include_expired", true)?
            // HackerTarget defaults
            .set_default("hackertarget_url", DEFAULT_HACKERTARGET_URL)?
            // VirusTotal defaults
            .set_default("virustotal_url", DEFAULT_VIRUSTOTAL_URL)?
            .set_default("virustotal_api_key", None::<String>)?
            .set_default("virustotal_api_key_env", DEFAULT_VIRUSTOTAL_API_KEY_ENV)?
            .set_default(
                "virustotal_subdomain_limit",
                DEFAULT_VIRUSTOTAL_SUBDOMAIN_LIMIT as i64,
            )?
            // Logging defaults
            .set_default("log_level", "INFO")?
            .set_default("log_format", "plain")?;

        fn read_env(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }

        fn parse_bool_env(key: &str) -> Option<bool> {
            read_env(key).and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            })
        }

        // String overrides
        if let Some(v) = read_env("RECONLIB_USER_AGENT") { builder = builder.set_override("user_agent", v)?; }
        if let Some(v) = read_env("RECONLIB_ENCODING") { builder = builder.set_override("encoding", v)?; }
        if let Some(v) = read_env("RECONLIB_CRTSH_URL") { builder = builder.set_override("crtsh_url", v)?; }
        if let Some(v) = read_env("RECONLIB_HACKERTARGET_URL") { builder = builder.set_override("hackertarget_url", v)?; }
        if let Some(v) = read_env("RECONLIB_VIRUSTOTAL_URL") { builder = builder.set_override("virustotal_url", v)?; }
        if let Some(v) = read_env("RECONLIB_VIRUSTOTAL_API_KEY") { builder = builder.set_override("virustotal_api_key", v)?; }
        if let Some(v) = read_env("RECONLIB_VIRUSTOTAL_API_KEY_ENV") { builder = builder.set_override("virustotal_api_key_env", v)?; }
        if let Some(v) = read_env("RECONLIB_LOG_LEVEL") { builder = builder.set_override("log_level", v)?; }
        if let Some(v) = read_env("RECONLIB_LOG_FORMAT") { builder = builder.set_override("log_format", v)?; }

        // Numeric overrides
        if let Some(v) = read_env("RECONLIB_HTTP_TIMEOUT_SECONDS").and_then(|s| s.parse::<f64>().ok()) { builder = builder.set_override("http_timeout_seconds", v)?; }
        if let Some(v) = read_env("RECONLIB_VIRUSTOTAL_SUBDOMAIN_LIMIT").and_then(|s| s.parse::<u32>().ok()) { builder = builder.set_override("virustotal_subdomain_limit", v as i64)?; }

        // Boolean overrides
        if let Some(v) = parse_bool_env("RECONLIB_CRTSH_WILDCARD") { builder = builder.set_override("crtsh_wildcard", v)?; }
        if let Some(v) = parse_bool_env("RECONLIB_CRTSH_INCLUDE_EXPIRED") { builder = builder.set_override("crtsh_include_expired", v)?; }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ReconError> {
        if !matches!(self.log_format.to_lowercase().as_str(), "json" | "plain") {
            return Err(ReconError::configuration(
                "log_format must be 'json' or 'plain'",
            ));
        }

        if self.http_timeout_seconds <= 0.0 || !self.http_timeout_seconds.is_finite() {
            return Err(ReconError::configuration(
                "http_timeout_seconds must be greater than 0",
            ));
        }

        if self.virustotal_subdomain_limit == 0 {
            return Err(ReconError::configuration(
                "virustotal_subdomain_limit must be greater than 0",
            ));
        }

        if self.virustotal_api_key_env.trim().is_empty() {
            return Err(ReconError::configuration(
                "virustotal_api_key_env cannot be empty",
            ));
        }

        if self.encoding.trim().is_empty() {
            return Err(ReconError::configuration("encoding cannot be empty"));
        }

        for (name, url) in [
            ("crtsh_url", &self.crtsh_url),
            ("hackertarget_url", &self.hackertarget_url),
            ("virustotal_url", &self.virustotal_url),
        ] {
            reqwest::Url::parse(url).map_err(|e| {
                ReconError::configuration(format!("{} is not a valid URL: {}", name, e))
            })?;
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: None,
            encoding: "utf-8".to_string(),
            http_timeout_seconds: 30.0,
            crtsh_url: DEFAULT_CRTSH_URL.to_string(),
            crtsh_wildcard: true,
            crtsh_include_expired: true,
            hackertarget_url: DEFAULT_HACKERTARGET_URL.to_string(),
            virustotal_url: DEFAULT_VIRUSTOTAL_URL.to_string(),
            virustotal_api_key: None,
            virustotal_api_key_env: DEFAULT_VIRUSTOTAL_API_KEY_ENV.to_string(),
            virustotal_subdomain_limit: DEFAULT_VIRUSTOTAL_SUBDOMAIN_LIMIT,
            log_level: "INFO".to_string(),
            log_format: "plain".to_string(),
        }
    }
}
